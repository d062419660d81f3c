pub mod onnx_frame_scorer;
