use super::*;

#[test]
fn reads_outside_are_transparent() {
    let mut r = Raster::new(Rectangle::new(2, 2, 2, 2));
    r.put(3, 3, [1.0, 0.5, 0.25, 1.0]);
    r.put(10, 10, [1.0; 4]);
    assert_eq!(r.get(3, 3), [1.0, 0.5, 0.25, 1.0]);
    assert_eq!(r.get(0, 0), [0.0; 4]);
    assert_eq!(r.pixels().iter().filter(|p| p[3] > 0.0).count(), 1);
}

#[test]
fn crop_pads_with_transparent() {
    let r = Raster::generate(Rectangle::new(0, 0, 4, 4), false, |x, y| {
        [x as f32, y as f32, 0.0, 1.0]
    });
    let c = r.crop(Rectangle::new(2, 2, 4, 4));
    assert_eq!(c.rect(), Rectangle::new(2, 2, 4, 4));
    assert_eq!(c.get(3, 3), [3.0, 3.0, 0.0, 1.0]);
    assert_eq!(c.get(5, 5), [0.0; 4]);
}

#[test]
fn parallel_and_serial_generation_agree() {
    let rect = Rectangle::new(-3, 7, 17, 9);
    let f = |x: i64, y: i64| [(x * 3 + y) as f32, 0.0, 0.0, 1.0];
    assert_eq!(Raster::generate(rect, true, f), Raster::generate(rect, false, f));
}

#[test]
fn empty_raster_skips_row_iteration() {
    let mut r = Raster::new(Rectangle::new(0, 0, 0, 5));
    r.for_each_row(true, |_, _| panic!("no rows expected"));
    assert!(r.pixels().is_empty());
}

#[test]
fn from_pixels_checks_length() {
    let rect = Rectangle::new(0, 0, 2, 2);
    assert!(Raster::from_pixels(rect, vec![[0.0; 4]; 3]).is_none());
    assert!(Raster::from_pixels(rect, vec![[0.0; 4]; 4]).is_some());
}
