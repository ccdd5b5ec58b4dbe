mod common;

use approx::assert_abs_diff_eq;

use zfold_core::error::ZfoldError;
use zfold_core::io::ser::{SerStack, StackLayout};
use zfold_core::plane::PlaneCoord;
use zfold_core::region::Region;
use zfold_core::source::PlaneSource;

use common::*;

#[test]
fn test_default_layout_is_z_only() {
    let frames = uniform_frames(4, 3, &[10, 20, 30]);
    let tmp = write_test_ser(&build_ser_with_frames(4, 3, &frames));

    let stack = SerStack::open(tmp.path(), None).unwrap();
    let dims = stack.dims();
    assert_eq!((dims.size_x, dims.size_y), (4, 3));
    assert_eq!((dims.size_z, dims.size_c, dims.size_t), (3, 1, 1));
    assert!(!stack.has_timestamps());

    let full = Region::full_frame(&dims);
    let plane = stack.plane(PlaneCoord::new(2, 0, 0), &full).unwrap();
    assert_eq!(plane.shape(), (3, 4));
    assert!(plane.data.iter().all(|&v| v == 30.0));
}

#[test]
fn test_xyzct_frame_order() {
    // 2 z, 2 c, 2 t; frame value = frame index.
    let values: Vec<u8> = (0..8).collect();
    let frames = uniform_frames(2, 2, &values);
    let tmp = write_test_ser(&build_ser_with_frames(2, 2, &frames));
    let layout = StackLayout {
        size_z: 2,
        size_c: 2,
        size_t: 2,
    };
    let stack = SerStack::open(tmp.path(), Some(layout)).unwrap();
    let full = Region::full_frame(&stack.dims());

    let v = |z, c, t| stack.plane(PlaneCoord::new(z, c, t), &full).unwrap().data[[0, 0]];
    assert_eq!(v(0, 0, 0), 0.0);
    assert_eq!(v(1, 0, 0), 1.0);
    assert_eq!(v(0, 1, 0), 2.0);
    assert_eq!(v(0, 0, 1), 4.0);
    assert_eq!(v(1, 1, 1), 7.0);
}

#[test]
fn test_layout_mismatch_rejected() {
    let frames = uniform_frames(2, 2, &[1, 2, 3]);
    let tmp = write_test_ser(&build_ser_with_frames(2, 2, &frames));
    let layout = StackLayout {
        size_z: 2,
        size_c: 1,
        size_t: 1,
    };
    let err = SerStack::open(tmp.path(), Some(layout)).err().unwrap();
    assert!(matches!(err, ZfoldError::InvalidLayout { frames: 3, .. }));
}

#[test]
fn test_tile_read_16bit() {
    let frame: Vec<u16> = (0..12).map(|v| v * 1000).collect();
    let tmp = write_test_ser(&build_ser_16bit(4, 3, &[frame]));
    let stack = SerStack::open(tmp.path(), None).unwrap();
    assert_eq!(stack.header.pixel_depth, 16);

    let tile = stack
        .plane(PlaneCoord::new(0, 0, 0), &Region::new(1, 1, 2, 2))
        .unwrap();
    assert_eq!(tile.shape(), (2, 2));
    assert_eq!(tile.data[[0, 0]], 5000.0);
    assert_eq!(tile.data[[0, 1]], 6000.0);
    assert_eq!(tile.data[[1, 0]], 9000.0);
    assert_eq!(tile.data[[1, 1]], 10000.0);
}

#[test]
fn test_out_of_frame_tile_is_unavailable() {
    let frames = uniform_frames(4, 4, &[1]);
    let tmp = write_test_ser(&build_ser_with_frames(4, 4, &frames));
    let stack = SerStack::open(tmp.path(), None).unwrap();
    let err = stack
        .plane(PlaneCoord::new(0, 0, 0), &Region::new(2, 2, 4, 4))
        .unwrap_err();
    assert!(matches!(err, ZfoldError::PlaneUnavailable { .. }));
}

#[test]
fn test_rejects_bad_magic_and_truncation() {
    let mut data = build_ser_with_frames(4, 4, &uniform_frames(4, 4, &[1, 2]));
    data[0] = b'X';
    let tmp = write_test_ser(&data);
    assert!(matches!(
        SerStack::open(tmp.path(), None),
        Err(ZfoldError::InvalidSer(_))
    ));

    let mut data = build_ser_with_frames(4, 4, &uniform_frames(4, 4, &[1, 2]));
    data.truncate(data.len() - 3);
    let tmp = write_test_ser(&data);
    assert!(matches!(
        SerStack::open(tmp.path(), None),
        Err(ZfoldError::InvalidSer(_))
    ));
}

#[test]
fn test_oversized_header_geometry_rejected() {
    let tmp = write_test_ser(&build_ser_header_full(0x7FFF_FFFF, 0x7FFF_FFFF, 16, 8, 0));
    let err = SerStack::open(tmp.path(), None).err().unwrap();
    assert!(matches!(err, ZfoldError::InvalidSer(_)), "{err:?}");

    // Negative width and height fields read back as huge unsigned values.
    let tmp = write_test_ser(&build_ser_header_full(u32::MAX, u32::MAX, 8, 2, 0));
    assert!(matches!(
        SerStack::open(tmp.path(), None),
        Err(ZfoldError::InvalidSer(_))
    ));
}

#[test]
fn test_color_stack_rejected() {
    let mut data = build_ser_header_full(2, 2, 8, 1, 8);
    data.extend_from_slice(&[0u8; 4]);
    let tmp = write_test_ser(&data);
    assert!(matches!(
        SerStack::open(tmp.path(), None),
        Err(ZfoldError::InvalidSer(_))
    ));
}

#[test]
fn test_timestamps_relative_seconds() {
    // 1 z, 2 c, 3 t: frame index = c + 2 * t.
    let frames = uniform_frames(2, 2, &[0, 0, 0, 0, 0, 0]);
    let mut data = build_ser_with_frames(2, 2, &frames);
    let origin = 638_000_000_000_000_000u64;
    let ticks: Vec<u64> = (0..6u64).map(|i| origin + i * 5_000_000).collect();
    append_timestamps(&mut data, &ticks);
    let tmp = write_test_ser(&data);

    let layout = StackLayout {
        size_z: 1,
        size_c: 2,
        size_t: 3,
    };
    let stack = SerStack::open(tmp.path(), Some(layout)).unwrap();
    assert!(stack.has_timestamps());

    let c0 = stack.timestamps_secs(0).unwrap();
    assert_eq!(c0.len(), 3);
    assert_abs_diff_eq!(c0[&0], 0.0);
    assert_abs_diff_eq!(c0[&1], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(c0[&2], 2.0, epsilon = 1e-9);

    let c1 = stack.timestamps_secs(1).unwrap();
    assert_abs_diff_eq!(c1[&2], 2.0, epsilon = 1e-9);

    assert!(stack.timestamps_secs(2).is_err());
}

#[test]
fn test_stack_info() {
    let frames = uniform_frames(3, 2, &[1, 2]);
    let tmp = write_test_ser(&build_ser_with_frames(3, 2, &frames));
    let stack = SerStack::open(tmp.path(), None).unwrap();
    let info = stack.stack_info(tmp.path());
    assert_eq!(info.bit_depth, 8);
    assert_eq!(info.dims.size_z, 2);
    assert!(info.observer.is_none());
    assert!(!info.has_timestamps);
}
