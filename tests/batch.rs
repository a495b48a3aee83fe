mod common;

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use image::ImageFormat;

use common::{crop, Script};
use gauge_reader::config::{load_config, save_config};
use gauge_reader::enhance::Passthrough;
use gauge_reader::field::{image_key, Field, SourceVariant};
use gauge_reader::processor::{run_batch, BatchParams, RESULTS_FILE};
use gauge_reader::rotation::Rotation;
use gauge_reader::source::{load_group, scan_groups, LoadedImage};
use gauge_reader::EvalConfig;

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("gauge_reader_{tag}_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write all nine crops of a group as PNG files named like the capture rig does.
fn write_group(root: &PathBuf, id: &str) -> Result<PathBuf> {
    let dir = root.join(id);
    fs::create_dir_all(&dir)?;
    for field in Field::ALL {
        for source in SourceVariant::ALL {
            let name = format!("{}_crop_{}.png", field.key(), source.key());
            crop(field, source).save(dir.join(name))?;
        }
    }
    Ok(dir)
}

#[test]
fn scan_keys_files_by_parent_directory() -> Result<()> {
    let root = scratch_dir("scan");
    write_group(&root, "G1")?;
    fs::write(root.join("G1").join("notes.txt"), "ignored")?;
    fs::write(root.join("G1").join("pressure_sr.png"), "ignored")?;

    let groups = scan_groups(&root)?;

    assert_eq!(groups.len(), 1);
    let g1 = &groups["G1"];
    assert_eq!(g1.len(), 9);
    assert!(g1.contains_key(&image_key(Field::Temperature, SourceVariant::V7)));

    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn batch_writes_sorted_jsonl() -> Result<()> {
    let input = scratch_dir("batch_in");
    let output = scratch_dir("batch_out").join("nested");

    write_group(&input, "b-ok")?;
    let missing = write_group(&input, "A-missing")?;
    fs::remove_file(missing.join("depth_crop_v8.png"))?;
    let corrupt = write_group(&input, "c-corrupt")?;
    fs::write(corrupt.join("angle_crop_v7.png"), b"not a png")?;

    let mut script = Script::new();
    script.set(Field::Angle, SourceVariant::Sr, Rotation::Upright, "+4.5", 0.95);
    script.set(Field::Temperature, SourceVariant::Sr, Rotation::Upright, "37", 0.90);
    script.set(Field::Depth, SourceVariant::Sr, Rotation::Upright, "123", 0.85);

    let params = BatchParams {
        input_dir: input.clone(),
        output_dir: output.clone(),
        jobs: Some(2),
    };
    let summary = run_batch(&params, &script, &Passthrough, &EvalConfig::default())?
        .expect("groups present");

    assert_eq!(summary.ok, 1);
    assert_eq!(summary.mistake, 2);
    assert_eq!(summary.jsonl, output.join(RESULTS_FILE));

    let text = fs::read_to_string(&summary.jsonl)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        r#"{"id":"A-missing","status":"MISTAKE","reason":"missing_files","missing":["depth_v8"],"mistakes":["missing_files"]}"#
    );
    let ok: serde_json::Value = serde_json::from_str(lines[1])?;
    assert_eq!(ok["id"], "b-ok");
    assert_eq!(ok["status"], "OK");
    assert_eq!(ok["values"]["temp"], 37.0);
    assert_eq!(ok["values"]["depth"], "123");
    assert_eq!(ok["values"]["angle"], "+4.5");
    assert_eq!(
        lines[2],
        r#"{"id":"c-corrupt","status":"MISTAKE","reason":"cant_read_image","mistakes":["cant_read_image"]}"#
    );

    fs::remove_dir_all(&input)?;
    fs::remove_dir_all(output.parent().unwrap())?;
    Ok(())
}

#[test]
fn crop_with_wrong_extension_still_decodes() -> Result<()> {
    let root = scratch_dir("sniff");
    let dir = root.join("G1");
    fs::create_dir_all(&dir)?;
    crop(Field::Angle, SourceVariant::Sr)
        .save_with_format(dir.join("angle_sr.jpg"), ImageFormat::Png)?;

    let groups = scan_groups(&root)?;
    let group = load_group("G1", &groups["G1"]);

    match &group.images["angle_sr"] {
        LoadedImage::Ready(img) => {
            assert_eq!(img.as_raw(), crop(Field::Angle, SourceVariant::Sr).as_raw())
        }
        LoadedImage::Unreadable(e) => panic!("PNG bytes under .jpg rejected: {e}"),
    }
    fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn batch_on_a_single_worker_keeps_every_group_in_order() -> Result<()> {
    let input = scratch_dir("batch_many_in");
    let output = scratch_dir("batch_many_out");
    let ids: Vec<String> = (0..12).rev().map(|i| format!("g{i:02}")).collect();
    for id in &ids {
        write_group(&input, id)?;
    }

    let params = BatchParams {
        input_dir: input.clone(),
        output_dir: output.clone(),
        jobs: Some(1),
    };
    let summary = run_batch(&params, &Script::new(), &Passthrough, &EvalConfig::default())?
        .expect("groups present");

    assert_eq!(summary.ok + summary.mistake, ids.len());
    let text = fs::read_to_string(&summary.jsonl)?;
    let mut seen = Vec::new();
    for line in text.lines() {
        let record: serde_json::Value = serde_json::from_str(line)?;
        seen.push(record["id"].as_str().unwrap().to_string());
    }
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(seen, expected);

    fs::remove_dir_all(&input)?;
    fs::remove_dir_all(&output)?;
    Ok(())
}

#[test]
fn empty_folder_yields_no_summary() -> Result<()> {
    let input = scratch_dir("empty");
    let params = BatchParams {
        input_dir: input.clone(),
        output_dir: input.join("out"),
        jobs: None,
    };

    let summary = run_batch(&params, &Script::new(), &Passthrough, &EvalConfig::default())?;

    assert!(summary.is_none());
    assert!(!input.join("out").exists());
    fs::remove_dir_all(&input)?;
    Ok(())
}

#[test]
fn config_round_trips_through_disk() -> Result<()> {
    let dir = scratch_dir("config");
    let path = dir.join("sub").join("gauge.json");
    let mut config = EvalConfig::default();
    config.score_threshold = 0.8;
    config.rotations = vec![Rotation::HalfTurn, Rotation::Upright];

    save_config(&path, &config)?;
    let loaded = load_config(&path)?;

    assert_eq!(loaded, config);
    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn invalid_config_file_is_rejected() -> Result<()> {
    let dir = scratch_dir("bad_config");
    let path = dir.join("gauge.json");
    fs::write(&path, r#"{"rotations": []}"#)?;

    assert!(load_config(&path).is_err());
    fs::remove_dir_all(&dir)?;
    Ok(())
}
