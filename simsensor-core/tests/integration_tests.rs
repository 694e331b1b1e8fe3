//! End-to-end tests: build wire messages, dispatch them, operate on the
//! typed measurements and export them to disk.

use simsensor_core::{
    deserialize_bytes, output, Color, ColorConverter, DvsEvent, FieldOrder, GnssMeasurement,
    ImuMeasurement, Location, Measurement, PlyWriter, PngWriter, RadarDetection, RawBuffer, Record,
    SensorData, SensorError, SensorHeader, SensorTag, Transform, Vector3D,
};
use simsensor_core::{
    CollisionEvent, LaneInvasionEvent, ObstacleDetectionEvent, RecordArray, Rotation,
};

fn transform() -> Transform {
    Transform::new(Location::new(10.0, -4.0, 1.7), Rotation::new(0.0, 90.0, 0.0))
}

fn header(tag: SensorTag) -> SensorHeader {
    SensorHeader::new(tag, 1024, 36.25, transform())
}

fn wire<R: Record>(header: SensorHeader, records: &[R]) -> Vec<u8> {
    RawBuffer::from_records(header, records).into_bytes()
}

fn dvs_message(width: u32, height: u32, events: &[DvsEvent]) -> Vec<u8> {
    wire(header(SensorTag::Dvs).with_camera(width, height, 90.0), events)
}

/// Every array-shaped modality covers its payload exactly and rejects
/// out-of-range access.
#[test]
fn test_array_views_cover_payload() {
    let messages = vec![
        wire(
            header(SensorTag::Image).with_camera(4, 3, 90.0),
            &[Color::new(1, 2, 3, 255); 12],
        ),
        wire(
            header(SensorTag::Lidar).with_lidar(0.5, vec![3, 2]),
            &[Location::new(1.0, 1.0, 1.0); 5],
        ),
        wire(header(SensorTag::Radar), &[RadarDetection::default(); 7]),
        dvs_message(8, 8, &[DvsEvent::new(1, 1, 1, true); 9]),
    ];

    for bytes in messages {
        let total = bytes.len();
        match deserialize_bytes(bytes).unwrap() {
            SensorData::Image(m) => check_array(&*m, total),
            SensorData::Lidar(m) => check_array(&*m, total),
            SensorData::Radar(m) => check_array(&*m, total),
            SensorData::Dvs(m) => check_array(&*m, total),
            other => panic!("unexpected modality {other}"),
        }
    }
}

fn check_array<R: Record>(array: &RecordArray<R>, message_len: usize) {
    let len = array.len();
    assert_eq!(len * R::SIZE, array.raw_data().len());
    assert!(array.raw_data().len() < message_len);
    for i in 0..len {
        assert!(array.at(i).is_ok());
    }
    assert_eq!(
        array.at(len).err(),
        Some(SensorError::IndexOutOfRange { index: len, len })
    );
}

/// Common header fields survive the trip through the wire format.
#[test]
fn test_header_fields_survive_dispatch() {
    let bytes = wire(header(SensorTag::Radar), &[RadarDetection::new(1.0, 0.1, 0.2, 30.0)]);
    let data = deserialize_bytes(bytes).unwrap();
    assert_eq!(data.frame(), 1024);
    assert_eq!(data.timestamp().to_bits(), 36.25f64.to_bits());
    assert_eq!(data.transform(), transform());
}

/// The rasterizer combines channels, and the two array encoders keep their
/// different polarity conventions.
#[test]
fn test_dvs_exports() {
    let bytes = dvs_message(
        2,
        1,
        &[DvsEvent::new(1, 0, 100, true), DvsEvent::new(1, 0, 105, false)],
    );
    let SensorData::Dvs(events) = deserialize_bytes(bytes).unwrap() else {
        panic!("expected DVS events");
    };

    let image = events.to_image().unwrap();
    assert_eq!(image[0], Color::default());
    assert_eq!((image[1].b, image[1].r), (255, 255));

    assert_eq!(events.to_array(), vec![[1, 0, 100, 1], [1, 0, 105, 0]]);
    assert_eq!(events.to_array_pol(), vec![1, -1]);
    assert_eq!(events.to_array_x(), vec![1, 1]);
    assert_eq!(events.to_array_t(), vec![100, 105]);
    assert_eq!(
        events.to_string(),
        "EventArray(frame=1024, timestamp=36.250000, dimensions=2x1, number_of_events=2)"
    );
}

/// In-place mutation through `set` is visible on the next pass.
#[test]
fn test_set_then_iterate() {
    let bytes = dvs_message(4, 4, &[DvsEvent::new(0, 0, 1, true); 3]);
    let SensorData::Dvs(mut events) = deserialize_bytes(bytes).unwrap() else {
        panic!("expected DVS events");
    };
    events.set(2, DvsEvent::new(3, 3, 99, false)).unwrap();
    let ts: Vec<i64> = events.iter().map(|e| e.t).collect();
    assert_eq!(ts, vec![1, 1, 99]);
    let again: Vec<i64> = (&events).into_iter().map(|e| e.t).collect();
    assert_eq!(ts, again);
}

#[test]
fn test_unknown_tag_and_corrupt_header() {
    let mut bytes = wire(header(SensorTag::Radar), &[RadarDetection::default()]);
    bytes[0] = 77;
    assert_eq!(
        deserialize_bytes(bytes).unwrap_err(),
        SensorError::UnknownSensorTag(77)
    );

    let bytes = dvs_message(2, 2, &[]);
    assert!(matches!(
        deserialize_bytes(bytes[..30].to_vec()),
        Err(SensorError::CorruptHeader { tag: Some(3), needed: 53, actual: 30 })
    ));
}

#[test]
fn test_scalar_measurements_format() {
    let gnss = RawBuffer::new(
        header(SensorTag::Gnss),
        &GnssMeasurement::encode_payload(0.5, -1.25, 120.0),
    );
    let imu = RawBuffer::new(
        header(SensorTag::Imu),
        &ImuMeasurement::encode_payload(Vector3D::new(1.0, 2.0, 3.0), Vector3D::default(), 0.5),
    );
    let collision = RawBuffer::new(
        header(SensorTag::Collision),
        &CollisionEvent::encode_payload(1, 2, Vector3D::default()),
    );
    let obstacle = RawBuffer::new(
        header(SensorTag::ObstacleDetection),
        &ObstacleDetectionEvent::encode_payload(1, 3, 4.5),
    );
    let lane = RawBuffer::new(
        header(SensorTag::LaneInvasion),
        &LaneInvasionEvent::encode_payload(1, &[]),
    );

    let rendered: Vec<String> = [gnss, imu, collision, obstacle, lane]
        .into_iter()
        .map(|raw| deserialize_bytes(raw.into_bytes()).unwrap().to_string())
        .collect();

    assert_eq!(
        rendered,
        vec![
            "GnssMeasurement(frame=1024, timestamp=36.250000, lat=0.500000, lon=-1.250000, alt=120.000000)",
            "IMUMeasurement(frame=1024, timestamp=36.250000, accelerometer=Vector3D(x=1.000000, y=2.000000, z=3.000000), gyroscope=Vector3D(x=0.000000, y=0.000000, z=0.000000), compass=0.500000)",
            "CollisionEvent(frame=1024, timestamp=36.250000, other_actor=2)",
            "ObstacleDetectionEvent(frame=1024, timestamp=36.250000, other_actor=3)",
            "LaneInvasionEvent(frame=1024, timestamp=36.250000)",
        ]
    );
}

/// Saving with a converter writes converted pixels and leaves the source
/// image usable.
#[test]
fn test_png_export() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = wire(
        header(SensorTag::Image).with_camera(2, 1, 90.0),
        &[Color::new(7, 0, 0, 255), Color::new(10, 0, 0, 255)],
    );
    let SensorData::Image(image) = deserialize_bytes(bytes).unwrap() else {
        panic!("expected image");
    };

    let path = image
        .save_to_disk(&PngWriter, dir.path().join("seg"), ColorConverter::CityScapesPalette)
        .unwrap();
    assert_eq!(path, dir.path().join("seg.png"));

    let png = image::open(&path).unwrap().to_rgb8();
    assert_eq!((png.width(), png.height()), (2, 1));
    assert_eq!(png.get_pixel(0, 0).0, [128, 64, 128]);
    assert_eq!(png.get_pixel(1, 0).0, [0, 0, 142]);

    assert_eq!(image.at(0).unwrap(), Color::new(7, 0, 0, 255));
    assert_eq!(image.converter(), ColorConverter::Raw);
}

#[test]
fn test_ply_export() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = wire(
        header(SensorTag::Lidar).with_lidar(0.0, vec![2]),
        &[Location::new(1.0, 2.0, 3.0), Location::new(-1.0, 0.5, 0.0)],
    );
    let SensorData::Lidar(lidar) = deserialize_bytes(bytes).unwrap() else {
        panic!("expected lidar");
    };
    let path = lidar
        .save_to_disk(&PlyWriter, dir.path().join("sweep.ply"))
        .unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("ply\nformat ascii 1.0\nelement vertex 2\n"));
    assert!(text.ends_with("1.0000 2.0000 3.0000\n-1.0000 0.5000 0.0000\n"));
}

#[test]
fn test_events_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = dvs_message(
        640,
        480,
        &[DvsEvent::new(5, 6, 1000, true), DvsEvent::new(7, 8, 1001, false)],
    );
    let SensorData::Dvs(events) = deserialize_bytes(bytes).unwrap() else {
        panic!("expected DVS events");
    };
    let path = output::write_events_csv(
        dir.path().join("events.csv"),
        events.iter(),
        Some((events.width(), events.height())),
        FieldOrder::TXYP,
    )
    .unwrap();

    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(
        text,
        "%geometry:640,480\nt,x,y,polarity\n1000,5,6,1\n1001,7,8,0\n"
    );
}

/// A rasterized event frame can be handed to the image codec.
#[test]
fn test_event_frame_png() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = dvs_message(2, 2, &[DvsEvent::new(0, 1, 5, true), DvsEvent::new(1, 1, 6, false)]);
    let SensorData::Dvs(events) = deserialize_bytes(bytes).unwrap() else {
        panic!("expected DVS events");
    };
    let frame = simsensor_core::record::pack(&events.to_image().unwrap());
    let path = simsensor_core::ImageCodec::write_image(
        &PngWriter,
        &dir.path().join("events.png"),
        simsensor_core::PixelView::new(2, 2, &frame),
    )
    .unwrap();

    let png = image::open(path).unwrap().to_rgb8();
    assert_eq!(png.get_pixel(0, 1).0, [0, 0, 255]);
    assert_eq!(png.get_pixel(1, 1).0, [255, 0, 0]);
    assert_eq!(png.get_pixel(0, 0).0, [0, 0, 0]);
}
