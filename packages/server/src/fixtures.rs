//! Shared test data: a small collision table and a hand-built model.

use wildlife_risk_data::CollisionTable;
use wildlife_risk_data::loader::parse_collisions;
use wildlife_risk_model::{ModelArtifact, ModelError, ModelSchema, Predictor, RiskPolicy, SchemaError};

use crate::Dashboard;

const SAMPLE: &str = "\
County,Municipality,Species,Time,Lat_WGS84,Long_WGS84
Värmlands län,Sunne,Moose,2021-09-14 19:45:00,59.83,13.14
Värmlands län,Sunne,Moose,2021-10-01 18:10:00,59.84,13.15
Värmlands län,Arvika,Roe deer,2021-10-02 06:10:00,59.65,12.59
Skåne län,Lund,Wild boar,2022-01-05 22:30:00,55.70,13.19
Skåne län,Lund,Moose,2022-09-20 19:00:00,,
";

const COLUMNS: [&str; 5] = [
    "Month",
    "Hour",
    "Species_Moose",
    "County_Värmlands län",
    "Municipality_Sunne",
];

const MODEL: &str = r#"{"kind":"logistic","classes":["0","1"],
    "coefficients":[[0.25,0.12,1.5,0.8,0.3]],"intercepts":[-4.5]}"#;

pub fn table() -> CollisionTable {
    parse_collisions(SAMPLE, "fixture.csv").unwrap()
}

pub fn predictor() -> Predictor {
    let schema = ModelSchema::new(COLUMNS.iter().map(|c| (*c).to_owned()).collect()).unwrap();
    let classifier = serde_json::from_str::<ModelArtifact>(MODEL)
        .unwrap()
        .into_classifier()
        .unwrap();
    Predictor::new(schema, classifier, RiskPolicy::default()).unwrap()
}

pub fn dashboard() -> Dashboard {
    Dashboard::new(table(), Ok(predictor()))
}

pub fn dashboard_without_model() -> Dashboard {
    Dashboard::new(table(), Err(ModelError::Schema(SchemaError::Empty)))
}
