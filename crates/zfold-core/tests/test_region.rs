use zfold_core::error::ZfoldError;
use zfold_core::plane::StackDims;
use zfold_core::region::{select_regions, Region, Shape};

fn dims(w: usize, h: usize) -> StackDims {
    StackDims {
        size_x: w,
        size_y: h,
        size_z: 4,
        size_c: 1,
        size_t: 1,
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64) -> Shape {
    Shape::Rectangle {
        x,
        y,
        width,
        height,
    }
}

#[test]
fn test_full_frame_without_roi_mode() {
    let d = dims(64, 32);
    let regions = select_regions(&d, false, &[rect(1.0, 1.0, 4.0, 4.0)]).unwrap();
    assert_eq!(regions, vec![Region::new(0, 0, 64, 32)]);
    assert_eq!(regions[0], Region::full_frame(&d));
}

#[test]
fn test_roi_only_with_no_shapes_is_an_error() {
    let err = select_regions(&dims(64, 32), true, &[]).unwrap_err();
    assert!(matches!(err, ZfoldError::NoUsableRegion));
}

#[test]
fn test_roi_only_ignores_non_rectangles() {
    let shapes = [
        Shape::Point { x: 3.0, y: 4.0 },
        Shape::Ellipse {
            cx: 10.0,
            cy: 10.0,
            rx: 3.0,
            ry: 3.0,
            z: 0,
            t: 0,
        },
        Shape::Polygon {
            points: vec![[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]],
        },
    ];
    let err = select_regions(&dims(64, 32), true, &shapes).unwrap_err();
    assert!(matches!(err, ZfoldError::NoUsableRegion));
}

#[test]
fn test_rectangles_floored_in_order() {
    let shapes = [
        rect(10.7, 2.2, 8.9, 4.5),
        Shape::Point { x: 1.0, y: 1.0 },
        rect(0.0, 0.0, 3.0, 3.0),
    ];
    let regions = select_regions(&dims(64, 32), true, &shapes).unwrap();
    assert_eq!(
        regions,
        vec![Region::new(10, 2, 8, 4), Region::new(0, 0, 3, 3)]
    );
}

#[test]
fn test_rectangles_clipped_or_dropped() {
    let shapes = [
        rect(60.0, 30.0, 10.0, 10.0),
        rect(100.0, 0.0, 5.0, 5.0),
        rect(-2.0, 0.0, 5.0, 5.0),
    ];
    let regions = select_regions(&dims(64, 32), true, &shapes).unwrap();
    assert_eq!(regions, vec![Region::new(60, 30, 4, 2)]);
}

#[test]
fn test_only_out_of_frame_rectangles_is_an_error() {
    let err = select_regions(&dims(8, 8), true, &[rect(20.0, 20.0, 4.0, 4.0)]).unwrap_err();
    assert!(matches!(err, ZfoldError::NoUsableRegion));
}

#[test]
fn test_shape_toml_tagging() {
    let toml_str = r#"
kind = "ellipse"
cx = 5.5
cy = 6.0
rx = 2.0
ry = 3.0
t = 4
"#;
    let shape: Shape = toml::from_str(toml_str).unwrap();
    assert_eq!(shape.kind(), "ellipse");
    assert_eq!(
        shape,
        Shape::Ellipse {
            cx: 5.5,
            cy: 6.0,
            rx: 2.0,
            ry: 3.0,
            z: 0,
            t: 4,
        }
    );
    assert!(shape.to_region().is_none());
}
