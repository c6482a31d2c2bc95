//! End-to-end batch runs over granule files on disk.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use front_engine::{BinKey, BinRecord, BinningScheme};
use front_mapper::{BatchMapper, BoundingBox, JsonGranuleReader, MapperConfig, CSV_HEADER};
use test_utils::fixtures::{bbox, schemes};
use test_utils::{create_chlorophyll_records, temp_test_dir, workspace_root, write_json_file};

fn granule_json(scheme: &BinningScheme, records: &[BinRecord], date: &str, bin_base: u64) -> Value {
    let records: Vec<Value> = records
        .iter()
        .map(|r| match r.key {
            BinKey::Number(bin) => json!({
                "bin": bin + bin_base,
                "weighted_sum": r.weighted_sum,
                "weight": r.weight,
            }),
            BinKey::Cell(cell) => json!({
                "row": cell.row,
                "col": cell.col,
                "weighted_sum": r.weighted_sum,
                "weight": r.weight,
            }),
        })
        .collect();

    let mut descriptor = json!({
        "kind": scheme.kind().to_string(),
        "total_bins": scheme.total_bins(),
        "row_count": scheme.row_count(),
    });
    match scheme {
        BinningScheme::Variable { row_bin_counts } => {
            descriptor["row_bin_counts"] = json!(row_bin_counts);
        }
        BinningScheme::Fixed { row_width, .. } => {
            descriptor["row_width"] = json!(row_width);
        }
    }

    json!({
        "scheme": descriptor,
        "date": date,
        "bin_base": bin_base,
        "records": records,
    })
}

fn config_for(input: &Path, output: &Path) -> MapperConfig {
    let mut config = MapperConfig::new(input, output);
    config.detector.use_log_transform = true;
    config
}

fn bounding_box((min_lon, min_lat, max_lon, max_lat): (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
}

fn read_rows(path: &Path) -> Vec<Vec<f64>> {
    let text = fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    lines
        .map(|line| {
            line.split(',')
                .take(3)
                .map(|field| field.parse::<f64>().unwrap())
                .collect()
        })
        .collect()
}

#[test]
fn test_batch_survives_corrupt_granule() {
    let input = temp_test_dir();
    let output = temp_test_dir();
    let scheme = schemes::coarse_isin();

    write_json_file(
        input.path(),
        "a.json",
        &granule_json(&scheme, &create_chlorophyll_records(&scheme, 0.4, 1), "2019-07-01", 0),
    );
    write_json_file(
        input.path(),
        "b.json",
        &granule_json(&scheme, &create_chlorophyll_records(&scheme, 0.4, 2), "20190702", 0),
    );
    fs::write(input.path().join("c.json"), "{ truncated").unwrap();

    let mapper = BatchMapper::new(JsonGranuleReader::new(), config_for(input.path(), output.path()));
    let report = mapper.run().unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("c.json"));
    assert!(!report.all_failed());

    let first = output.path().join("2019-07").join("2019-07-01_chlor.csv");
    let second = output.path().join("2019-07").join("2019-07-02_chlor.csv");
    assert!(first.exists());
    assert!(second.exists());

    // Both good granules went through the shared geometry cache.
    let stats = mapper.engine().cache_stats();
    assert_eq!(stats.hits + stats.misses, 2);
    assert!(stats.misses >= 1);
}

#[test]
fn test_rows_are_cropped_and_never_fill() {
    let input = temp_test_dir();
    let output = temp_test_dir();
    let scheme = schemes::coarse_isin();
    write_json_file(
        input.path(),
        "granule.json",
        &granule_json(&scheme, &create_chlorophyll_records(&scheme, 0.4, 5), "2019-07-01", 0),
    );

    let config = config_for(input.path(), output.path());
    assert_eq!(config.bbox, bounding_box(bbox::NE_PACIFIC));
    let mapper = BatchMapper::new(JsonGranuleReader::new(), config);
    let report = mapper.run().unwrap();
    assert_eq!(report.succeeded.len(), 1);

    let (min_lon, min_lat, max_lon, max_lat) = bbox::NE_PACIFIC;
    let rows = read_rows(&report.succeeded[0].output);
    assert!(!rows.is_empty());
    assert_eq!(rows.len(), report.rows_written());
    for row in rows {
        let (lat, lon, value) = (row[0], row[1], row[2]);
        assert!((min_lat..=max_lat).contains(&lat), "latitude {} outside crop", lat);
        assert!((min_lon..=max_lon).contains(&lon), "longitude {} outside crop", lon);
        assert!(value != -999.0 && value < 40.0);
    }
}

#[test]
fn test_crop_across_antimeridian() {
    let input = temp_test_dir();
    let output = temp_test_dir();
    let scheme = schemes::coarse_isin();
    write_json_file(
        input.path(),
        "granule.json",
        &granule_json(&scheme, &create_chlorophyll_records(&scheme, 0.4, 5), "2019-07-01", 0),
    );

    let mut config = config_for(input.path(), output.path());
    config.bbox = bounding_box(bbox::PACIFIC);
    let report = BatchMapper::new(JsonGranuleReader::new(), config).run().unwrap();

    let (min_lon, min_lat, max_lon, max_lat) = bbox::PACIFIC;
    let rows = read_rows(&report.succeeded[0].output);
    assert!(!rows.is_empty());
    for row in rows {
        let (lat, lon) = (row[0], row[1]);
        assert!((min_lat..=max_lat).contains(&lat), "latitude {} outside crop", lat);
        assert!(lon >= min_lon || lon <= max_lon, "longitude {} outside crop", lon);
    }
}

#[test]
fn test_shipped_config_drives_a_batch() {
    let input = temp_test_dir();
    let output = temp_test_dir();
    let scheme = schemes::coarse_isin();
    write_json_file(
        input.path(),
        "granule.json",
        &granule_json(&scheme, &create_chlorophyll_records(&scheme, 0.4, 3), "2019-07-01", 0),
    );

    let path = workspace_root().join("services/front-mapper/config/mapper.yaml");
    let mut config = MapperConfig::load(path).unwrap();
    config.input_dir = input.path().to_path_buf();
    config.output_dir = output.path().to_path_buf();

    let report = BatchMapper::new(JsonGranuleReader::new(), config).run().unwrap();
    assert_eq!(report.succeeded.len(), 1);
    assert!(output.path().join("2019-07").join("2019-07-01_chlor.csv").exists());
}

#[test]
fn test_one_based_archive_matches_zero_based() {
    let scheme = schemes::coarse_isin();
    let records = create_chlorophyll_records(&scheme, 0.4, 9);

    let zero_in = temp_test_dir();
    let zero_out = temp_test_dir();
    write_json_file(zero_in.path(), "g.json", &granule_json(&scheme, &records, "2019-07-01", 0));

    let one_in = temp_test_dir();
    let one_out = temp_test_dir();
    write_json_file(one_in.path(), "g.json", &granule_json(&scheme, &records, "2019-07-01", 1));

    let zero = BatchMapper::new(JsonGranuleReader::new(), config_for(zero_in.path(), zero_out.path()))
        .run()
        .unwrap();
    let one = BatchMapper::new(JsonGranuleReader::new(), config_for(one_in.path(), one_out.path()))
        .run()
        .unwrap();

    assert_eq!(
        fs::read_to_string(&zero.succeeded[0].output).unwrap(),
        fs::read_to_string(&one.succeeded[0].output).unwrap()
    );
}

#[test]
fn test_every_granule_failing_is_reported() {
    let input = temp_test_dir();
    let output = temp_test_dir();
    let scheme = schemes::two_by_four();
    // Bin 8 is one past the end of a two-by-four scheme.
    write_json_file(
        input.path(),
        "bad.json",
        &granule_json(&scheme, &[BinRecord::mean(8, 1.0)], "2019-07-01", 0),
    );

    let report = BatchMapper::new(JsonGranuleReader::new(), config_for(input.path(), output.path()))
        .run()
        .unwrap();

    assert!(report.all_failed());
    assert!(report.failed[0].1.contains("bin 8 is outside"));
}

#[test]
fn test_empty_input_directory() {
    let input = temp_test_dir();
    let output = temp_test_dir();
    let report = BatchMapper::new(JsonGranuleReader::new(), config_for(input.path(), output.path()))
        .run()
        .unwrap();
    assert_eq!(report.total(), 0);
    assert!(!report.all_failed());
}
