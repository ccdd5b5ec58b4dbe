mod common;

use ndarray::Array2;
use tempfile::tempdir;

use zfold_core::io::image_io::{ImageStackWriter, PlaneFormat};
use zfold_core::io::ser::{SerStack, StackLayout};
use zfold_core::io::ser_writer::{encode_u16_le, SerStackWriter};
use zfold_core::plane::{Plane, PlaneCoord, StackDims};
use zfold_core::project::{project_into, ProjectionMethod, ProjectionOutcome, ProjectionSpec};
use zfold_core::region::Region;
use zfold_core::source::{InMemoryStack, PlaneSource};

use common::load_image_plane;

/// 2 z, 2 c, 3 t; plane (z, c, t) is filled with `100 * c + 10 * t + z`.
fn czt_stack() -> InMemoryStack {
    let dims = StackDims {
        size_x: 4,
        size_y: 3,
        size_z: 2,
        size_c: 2,
        size_t: 3,
    };
    let mut planes = Vec::new();
    for t in 0..3 {
        for c in 0..2 {
            for z in 0..2 {
                planes.push(Array2::from_elem((3, 4), (100 * c + 10 * t + z) as f64));
            }
        }
    }
    InMemoryStack::new(dims, planes).unwrap()
}

#[test]
fn test_ser_output_reads_back_as_channel_time_stack() {
    let dir = tempdir().unwrap();
    let stack = czt_stack();
    let dims = stack.dims();
    let spec = ProjectionSpec::new(
        ProjectionMethod::Maximum,
        None,
        None,
        vec![Region::full_frame(&dims)],
        &dims,
    )
    .unwrap();

    let mut writer = SerStackWriter::new(dir.path(), "cells_MAX", 2, 3, 1);
    let outcome = project_into(&stack, &spec, &mut writer).unwrap();
    assert_eq!(outcome, ProjectionOutcome::Completed { planes: 6 });
    assert_eq!(writer.written(), &[dir.path().join("cells_MAX.ser")]);
    assert_eq!(writer.clamped_samples(), 0);

    let layout = StackLayout {
        size_z: 1,
        size_c: 2,
        size_t: 3,
    };
    let out = SerStack::open(&writer.written()[0], Some(layout)).unwrap();
    assert_eq!(out.header.pixel_depth, 16);
    let full = Region::full_frame(&out.dims());
    for c in 0..2 {
        for t in 0..3 {
            let plane = out.plane(PlaneCoord::new(0, c, t), &full).unwrap();
            assert_eq!(plane.shape(), (3, 4));
            let expected = (100 * c + 10 * t + 1) as f64;
            assert!(plane.data.iter().all(|&v| v == expected));
        }
    }
}

#[test]
fn test_ser_output_one_file_per_region() {
    let dir = tempdir().unwrap();
    let stack = czt_stack();
    let dims = stack.dims();
    let regions = vec![Region::new(0, 0, 2, 2), Region::new(2, 1, 2, 2)];
    let spec = ProjectionSpec::new(ProjectionMethod::Sum, None, None, regions, &dims).unwrap();

    let mut writer = SerStackWriter::new(dir.path(), "cells_SUM", 2, 3, 2);
    project_into(&stack, &spec, &mut writer).unwrap();
    assert_eq!(
        writer.written(),
        &[
            dir.path().join("cells_SUM_roi1.ser"),
            dir.path().join("cells_SUM_roi2.ser"),
        ]
    );
    let roi2 = SerStack::open(&writer.written()[1], None).unwrap();
    assert_eq!((roi2.header.width, roi2.header.height), (2, 2));
    assert_eq!(roi2.frame_count(), 6);
}

#[test]
fn test_encode_clamps_out_of_range() {
    let plane = Plane::new(ndarray::array![[-3.0, 1.4], [70000.0, 65535.0]]);
    let (bytes, clamped) = encode_u16_le(&plane);
    assert_eq!(clamped, 2);
    let samples: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(samples, vec![0, 1, 65535, 65535]);
}

#[test]
fn test_tiff_planes_per_channel_and_time() {
    let dir = tempdir().unwrap();
    let stack = czt_stack();
    let dims = stack.dims();
    let spec = ProjectionSpec::new(
        ProjectionMethod::Mean,
        None,
        None,
        vec![Region::full_frame(&dims)],
        &dims,
    )
    .unwrap();

    let mut writer = ImageStackWriter::new(dir.path(), "cells_MEAN", PlaneFormat::Tiff, 1);
    project_into(&stack, &spec, &mut writer).unwrap();
    assert_eq!(writer.written().len(), 6);

    let path = writer.path_for(0, 1, 2);
    assert_eq!(path, dir.path().join("cells_MEAN_c1_t2.tiff"));
    let plane = load_image_plane(&path);
    assert_eq!(plane.dim(), (3, 4));
    // mean of 120 and 121 rounds to 121
    assert!(plane.iter().all(|&v| v == 121.0));
}

#[test]
fn test_png_naming_with_regions() {
    let dir = tempdir().unwrap();
    let writer = ImageStackWriter::new(dir.path(), "img_MIN", PlaneFormat::Png, 3);
    assert_eq!(
        writer.path_for(2, 0, 4),
        dir.path().join("img_MIN_roi3_c0_t4.png")
    );
}
