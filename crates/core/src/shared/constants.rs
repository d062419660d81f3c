/// Side length of the square crops the classifier was trained on.
pub const CROP_SIZE: u32 = 128;

/// Scores strictly above this are labelled fake.
pub const FAKE_THRESHOLD: f32 = 0.5;

/// Default number of scored crops collected before a verdict is formed.
pub const DEFAULT_MAX_FRAMES: usize = 20;

/// Classifier fine-tuned from MobileNetV2 on face crops, exported to ONNX.
pub const CLASSIFIER_MODEL_NAME: &str = "def_video_face_mnv2.onnx";

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const BLAZEFACE_MODEL_NAME: &str = "blazeface_short_range.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
