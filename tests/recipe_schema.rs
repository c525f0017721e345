//! Integration tests for table loading and the preprocessing recipe.

use std::io::Write;
use std::path::PathBuf;

use gbtune::config::ColumnRoles;
use gbtune::recipe::FittedRecipe;
use gbtune::table::RawTable;

fn write_temp_csv(name: &str, content: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gbtune_{}_{}", std::process::id(), name));
    let mut file = std::fs::File::create(&path).expect("create temp csv");
    file.write_all(content.as_bytes()).expect("write temp csv");
    path
}

fn roles() -> ColumnRoles {
    ColumnRoles {
        outcome: "price".to_string(),
        id_columns: vec!["id".to_string()],
        date_column: Some("date".to_string()),
    }
}

const SAMPLE: &str = "\
id,date,price,sqft,grade,constant,rooms
1,2014-10-13,220.0,1180,good,7,3
2,2014-12-09,538.0,2570,better,7,3
3,2015-02-25,180.0,770,good,7,2
4,2014-12-09,604.0,1960,best,7,4
5,2015-02-18,510.0,1680,better,7,
6,2014-05-12,1225.0,5420,best,7,4
7,2014-06-27,257.5,1715,good,7,2
8,2015-01-15,291.8,1060,good,7,3
";

// ---------------------------------------------------------------------------
// Table loading
// ---------------------------------------------------------------------------

#[test]
fn loads_roles_and_decomposes_date() {
    let path = write_temp_csv("load.csv", SAMPLE);
    let table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(table.n_rows(), 8);
    // Identifier dropped, date decomposed.
    assert!(table.column("id").is_none(), "id must not survive loading");
    assert!(table.column("date").is_none(), "raw date must not survive");
    assert!(table.column("date_year").is_some());
    assert!(table.column("date_month").is_some());

    let predictors = table.predictor_names();
    assert!(!predictors.contains(&"price"), "outcome is not a predictor");
}

#[test]
fn missing_outcome_column_is_an_error() {
    let path = write_temp_csv("noout.csv", "id,sqft\n1,100\n");
    let result = RawTable::from_csv(&path, &roles());
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Recipe: fit once, apply anywhere
// ---------------------------------------------------------------------------

#[test]
fn schema_round_trip_between_splits() {
    let path = write_temp_csv("schema.csv", SAMPLE);
    let table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();

    let (train, test) = table.split(0.25, 5);
    let recipe = FittedRecipe::fit(&train).unwrap();

    let train_data = recipe.apply(&train).unwrap();
    let test_data = recipe.apply(&test).unwrap();

    // Same feature count and names regardless of which split is transformed.
    assert_eq!(train_data.n_features(), test_data.n_features());
    assert_eq!(train_data.feature_names, test_data.feature_names);
    assert_eq!(train_data.n_rows() + test_data.n_rows(), 8);
}

#[test]
fn zero_variance_column_is_dropped() {
    let path = write_temp_csv("zv.csv", SAMPLE);
    let table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();

    let recipe = FittedRecipe::fit(&table).unwrap();
    assert!(
        !recipe.feature_names().iter().any(|n| n == "constant"),
        "constant column must be dropped, got {:?}",
        recipe.feature_names()
    );
}

#[test]
fn one_hot_includes_a_novel_level() {
    let path = write_temp_csv("novel.csv", SAMPLE);
    let table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();

    let recipe = FittedRecipe::fit(&table).unwrap();
    let names = recipe.feature_names();
    assert!(names.iter().any(|n| n == "grade_good"));
    assert!(names.iter().any(|n| n == "grade_better"));
    assert!(names.iter().any(|n| n == "grade_best"));
    assert!(
        names.iter().any(|n| n == "grade_new"),
        "reserved novel level missing: {:?}",
        names
    );
}

#[test]
fn unseen_category_maps_to_novel_indicator() {
    let path = write_temp_csv("unseen_fit.csv", SAMPLE);
    let table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();
    let recipe = FittedRecipe::fit(&table).unwrap();

    // New table with a grade level never seen at fit time.
    let other = "\
id,date,price,sqft,grade,constant,rooms
9,2015-03-03,400.0,1500,astonishing,7,3
";
    let path = write_temp_csv("unseen_apply.csv", other);
    let other_table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();

    let data = recipe.apply(&other_table).unwrap();
    let novel_idx = data
        .feature_names
        .iter()
        .position(|n| n == "grade_new")
        .unwrap();
    assert_eq!(data.x[(0, novel_idx)], 1.0, "unseen level must hit grade_new");

    for (idx, name) in data.feature_names.iter().enumerate() {
        if name.starts_with("grade_") && name != "grade_new" {
            assert_eq!(data.x[(0, idx)], 0.0, "{} should be 0", name);
        }
    }
}

#[test]
fn missing_numeric_values_are_imputed() {
    let path = write_temp_csv("impute.csv", SAMPLE);
    let table = RawTable::from_csv(&path, &roles()).unwrap();
    std::fs::remove_file(&path).ok();

    let recipe = FittedRecipe::fit(&table).unwrap();
    let data = recipe.apply(&table).unwrap();

    // Row 5 has a missing `rooms`; every cell must still be finite.
    for row in 0..data.n_rows() {
        for col in 0..data.n_features() {
            assert!(
                data.x[(row, col)].is_finite(),
                "non-finite value at ({}, {})",
                row,
                col
            );
        }
    }
}
