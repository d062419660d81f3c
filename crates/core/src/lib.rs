//! Deepfake detection core: face location, per-crop scoring and the
//! aggregation of a frame stream into a single REAL/FAKE verdict.

pub mod detection {
    pub mod domain {
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod overlay {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod analysis_config;
    pub mod analysis_error;
    pub mod analyze_video_use_case;
    pub mod overlay_video_use_case;
    pub mod pipeline_logger;
}

pub mod scoring {
    pub mod domain {
        pub mod face_crop;
        pub mod frame_scorer;
        pub mod score_smoother;
        pub mod verdict;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod constants;
    pub mod face_box;
    pub mod frame;
    pub mod model_resolver;
    pub mod onnx_session;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}
