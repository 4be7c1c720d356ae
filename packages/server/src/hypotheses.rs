//! The hypotheses the analysis and the model are built around.

use wildlife_risk_server_models::ApiHypothesis;

const HYPOTHESES: [(&str, &str, &str); 3] = [
    (
        "Moose collisions increase during autumn",
        "Moose collision rates increase during autumn months (September-November).",
        "Moose are more active during the mating season in the fall, which increases road \
         crossings and collision risk.",
    ),
    (
        "Collisions are more common at dawn and dusk",
        "Wildlife collisions occur more frequently during early morning and evening hours.",
        "Many wild animals are crepuscular, and their active hours overlap with times of low \
         driver visibility.",
    ),
    (
        "Certain counties report consistently high collision rates",
        "Some counties have higher wildlife collision rates regardless of season or time.",
        "Local forest density and animal populations can cause persistent geographic risk \
         patterns.",
    ),
];

/// All hypotheses, in display order.
#[must_use]
pub fn hypotheses() -> Vec<ApiHypothesis> {
    (1_u8..)
        .zip(HYPOTHESES)
        .map(|(id, (title, statement, rationale))| ApiHypothesis {
            id,
            title: title.to_owned(),
            statement: statement.to_owned(),
            rationale: rationale.to_owned(),
        })
        .collect()
}
