mod common;

use std::fs;
use std::path::Path;

use common::*;
use image::imageops;
use lesionprep::ExtractJob;
use lesionprep::dataset::{boxes_path_for, create_dir, list_rasters, load_raster, load_set, load_shuffled_set};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[test]
fn listing_is_sorted_and_keeps_only_rasters() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    for name in ["b.png", "a.jpg", "c.TIF", "notes.txt", "d.jpeg"] {
        fs::write(dir.path().join(name), b"")?;
    }
    fs::create_dir(dir.path().join("e.png"))?;

    let names: Vec<String> = list_rasters(dir.path())?
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.jpg", "b.png", "c.TIF", "d.jpeg"]);
    Ok(())
}

#[test]
fn create_dir_reports_success_as_a_flag() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("out");

    assert!(create_dir(&out));
    assert!(!create_dir(&out));
    assert!(!create_dir(&dir.path().join("missing/parent")));
    Ok(())
}

#[test]
fn box_files_pair_by_stem() {
    assert_eq!(
        boxes_path_for(Path::new("/data/img/EDD_0001.jpeg"), Path::new("/data/bbox")),
        Path::new("/data/bbox/EDD_0001.txt")
    );
    assert_eq!(
        boxes_path_for(Path::new("frames/a.b.png"), Path::new("boxes")),
        Path::new("boxes/a.b.txt")
    );
}

#[test]
fn load_set_decodes_by_kind() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    save_rgb(&coordinate_image(8, 4), &dir.path().join("x.png"));
    save_gray(&ramp_mask(3, 3), &dir.path().join("y.png"));

    let (rasters, paths) = load_set(dir.path(), RasterKind::Mask)?;
    assert_eq!(paths.len(), 2);
    assert!(rasters.iter().all(|r| r.kind() == RasterKind::Mask));
    assert_eq!(rasters[0].dimensions(), (8, 4));
    assert_eq!(rasters[1], Raster::Mask(ramp_mask(3, 3)));
    Ok(())
}

#[test]
fn shuffled_set_keeps_images_paired_with_their_paths() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    for width in 1..=8u32 {
        save_gray(&ramp_mask(width, 2), &dir.path().join(format!("w{width}.png")));
    }

    let (rasters, paths) = load_shuffled_set(dir.path(), RasterKind::Mask, &mut StdRng::seed_from_u64(42))?;

    let mut expected = list_rasters(dir.path())?;
    expected.shuffle(&mut StdRng::seed_from_u64(42));
    assert_eq!(paths, expected);

    for (raster, path) in rasters.iter().zip(&paths) {
        let name = path.file_stem().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("w{}", raster.width()));
    }

    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(sorted, list_rasters(dir.path())?);
    Ok(())
}

#[test]
fn resize_job_writes_images_and_remapped_boxes() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let (src, dst) = (root.path().join("img"), root.path().join("img_224"));
    let (box_src, box_dst) = (root.path().join("bbox"), root.path().join("bbox_224"));
    fs::create_dir(&src)?;
    fs::create_dir(&box_src)?;

    let wide = coordinate_image(448, 224);
    save_rgb(&wide, &src.join("frame_01.png"));
    save_rgb(&coordinate_image(896, 448), &src.join("frame_02.png"));

    let catalog = Catalog::default();
    let codec = BoxCodec::new(&catalog);
    codec.encode_all(&box_src.join("frame_01.txt"), &[make_box("suspicious", 100, 50, 200, 150)])?;
    codec.encode_all(
        &box_src.join("frame_02.txt"),
        &[make_box("BE", 101, 51, 203, 149), make_box("polyp", 0, 0, 896, 448)],
    )?;

    let report = ResizeJob::new(&src, &dst)
        .with_boxes(&box_src, &box_dst)
        .run(&catalog)?;

    assert_eq!(report.written(), 2);
    assert_eq!(report.failures().count(), 0);

    let out = load_raster(&dst.join("frame_01.png"), RasterKind::Color)?;
    assert_eq!(out, Raster::Color(imageops::crop_imm(&wide, 74, 0, 224, 224).to_image()));
    assert_eq!(load_raster(&dst.join("frame_02.png"), RasterKind::Color)?.dimensions(), (224, 224));

    assert_eq!(
        fs::read_to_string(box_dst.join("frame_01.txt"))?,
        "100 50 200 150 suspicious\n"
    );
    assert_eq!(
        codec.decode_all(&box_dst.join("frame_02.txt"))?,
        vec![make_box("BE", 50, 25, 101, 74), make_box("polyp", 0, 0, 448, 224)]
    );
    Ok(())
}

#[test]
fn mask_job_keeps_a_single_channel() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let (src, dst) = (root.path().join("masks"), root.path().join("masks_224"));
    fs::create_dir(&src)?;
    save_gray(&ramp_mask(224, 336), &src.join("m.png"));

    let report = ResizeJob::new(&src, &dst)
        .with_kind(RasterKind::Mask)
        .run(&Catalog::default())?;
    assert_eq!(report.written(), 1);

    let decoded = image::open(dst.join("m.png"))?;
    assert_eq!(decoded.color(), image::ColorType::L8);
    assert_eq!((decoded.width(), decoded.height()), (224, 224));
    Ok(())
}

fn job_with_one_broken_box_file(root: &Path) -> anyhow::Result<ResizeJob> {
    let (src, box_src) = (root.join("img"), root.join("bbox"));
    fs::create_dir(&src)?;
    fs::create_dir(&box_src)?;

    for name in ["a", "b", "c"] {
        save_rgb(&coordinate_image(300, 200), &src.join(format!("{name}.png")));
    }
    fs::write(box_src.join("a.txt"), "1 2 3 4 BE\n")?;
    fs::write(box_src.join("b.txt"), "1 2 3 4 adenoma\n")?;
    fs::write(box_src.join("c.txt"), "5 6 7 8 HGD\n")?;

    Ok(ResizeJob::new(&src, root.join("out")).with_boxes(&box_src, root.join("bbox_out")))
}

#[test]
fn fail_fast_stops_at_the_first_bad_file() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let job = job_with_one_broken_box_file(root.path())?;

    let err = job.run(&Catalog::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownCategory(n) if n == "adenoma"));

    assert!(root.path().join("out/a.png").exists());
    assert!(!root.path().join("out/b.png").exists());
    assert!(!root.path().join("out/c.png").exists());
    Ok(())
}

#[test]
fn collect_all_records_failures_and_continues() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let job = job_with_one_broken_box_file(root.path())?.with_policy(FailurePolicy::CollectAll);

    let report = job.run(&Catalog::default())?;
    assert_eq!(report.written(), 2);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.file_name().unwrap(), "b.png");
    assert!(matches!(failures[0].1, Error::UnknownCategory(_)));

    assert!(root.path().join("out/c.png").exists());
    assert!(!root.path().join("bbox_out/b.txt").exists());
    Ok(())
}

#[test]
fn missing_box_file_is_reported() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let src = root.path().join("img");
    fs::create_dir(&src)?;
    fs::create_dir(root.path().join("bbox"))?;
    save_rgb(&coordinate_image(224, 224), &src.join("lonely.png"));

    let err = ResizeJob::new(&src, root.path().join("out"))
        .with_boxes(root.path().join("bbox"), root.path().join("bbox_out"))
        .run(&Catalog::default())
        .unwrap_err();
    assert!(matches!(err, Error::MissingFile(p) if p.ends_with("bbox/lonely.txt")));
    Ok(())
}

#[test]
fn unusable_output_directory_is_an_error() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let src = root.path().join("img");
    fs::create_dir(&src)?;

    let blocked = root.path().join("file_not_dir");
    fs::write(&blocked, b"")?;

    let err = ResizeJob::new(&src, &blocked).run(&Catalog::default()).unwrap_err();
    assert!(matches!(err, Error::DirectoryCreateFailure(p) if p == blocked));
    Ok(())
}

#[test]
fn extract_job_writes_one_box_file_per_image() -> anyhow::Result<()> {
    let root = tempfile::TempDir::new()?;
    let (masks, out) = (root.path().join("masks"), root.path().join("bbox"));
    fs::create_dir(&masks)?;

    save_gray(&block_plane(64, 48, 10, 10, 20, 30), &masks.join("EDD_0001_cancer.png"));
    save_gray(&block_plane(64, 48, 0, 0, 5, 5), &masks.join("EDD_0001_BE.png"));
    save_gray(&block_plane(64, 48, 0, 0, 0, 0), &masks.join("EDD_0002_polyp.png"));
    save_gray(&ramp_mask(4, 4), &masks.join("stray.png"));

    let catalog = Catalog::default();
    let report = ExtractJob::new(&masks, &out).run(&catalog)?;
    assert_eq!(report.written(), 2);

    let codec = BoxCodec::new(&catalog);
    assert_eq!(
        codec.decode_all(&out.join("EDD_0001.txt"))?,
        vec![make_box("BE", 0, 0, 5, 5), make_box("cancer", 10, 10, 20, 30)]
    );
    assert_eq!(fs::read_to_string(out.join("EDD_0002.txt"))?, "");
    Ok(())
}
