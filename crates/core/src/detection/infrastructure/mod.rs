pub mod model_resolver;
pub mod onnx_person_detector;
