use opera_archive::{Performance, PerformanceDraft, ROLE_STAGE_DIRECTOR};

/// A minimal valid performance.
pub fn performance(name: &str) -> Performance {
    PerformanceDraft::new(name, "Giuseppe Verdi", "WSO", "Premiere")
        .build()
        .expect("valid draft")
}

/// A performance on a specific (possibly approximate) date.
pub fn performance_on(name: &str, date: &str) -> Performance {
    let mut draft = PerformanceDraft::new(name, "Giuseppe Verdi", "WSO", "Premiere");
    draft.date = Some(date.parse().expect("valid date"));
    draft.build().expect("valid draft")
}

/// A performance with a named director, so it carries a production key.
pub fn staged_performance(name: &str, composer: &str, production: &str, director: &str) -> Performance {
    let mut draft = PerformanceDraft::new(name, composer, "WSO", production);
    draft
        .leading_team
        .insert(ROLE_STAGE_DIRECTOR.to_string(), vec![director.to_string()]);
    draft.build().expect("valid draft")
}
