use std::path::Path;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::person_detector::PersonDetector;
use crate::shared::frame::Frame;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Minimum class score for a raw detection to enter NMS.
const CANDIDATE_THRESHOLD: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// YOLOv8 object detector backed by an ONNX Runtime session.
///
/// Handles letterbox preprocessing, inference and NMS post-processing.
/// Emits raw detections for every COCO class; selecting persons is the
/// domain filter's job.
pub struct OnnxPersonDetector {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxPersonDetector {
    /// Load a YOLOv8 ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape
    /// (expecting NCHW). Falls back to 640 if the shape is dynamic or
    /// unreadable.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                // shape is [N, C, H, W] — H and W are equal for square input
                ort::value::ValueType::Tensor { ref shape, .. } if shape.len() >= 4 => {
                    u32::try_from(shape[2]).ok().filter(|&s| s > 0)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            input_size,
        })
    }
}

/// ONNX execution providers for the current platform, best first.
///
/// ort falls back to CPU when the hardware provider is unavailable.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

impl PersonDetector for OnnxPersonDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        // YOLOv8 output is [1, num_features, num_detections] (transposed)
        // or [1, num_detections, num_features]. Handle both.
        let (num_dets, num_feats, transposed) = if shape.len() == 3 {
            if shape[1] < shape[2] {
                (shape[2], shape[1], true)
            } else {
                (shape[1], shape[2], false)
            }
        } else {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        };

        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let detections = decode_output(data, num_dets, num_feats, transposed, scale, pad_x, pad_y);
        Ok(nms(detections, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let (fw, fh) = (frame.width() as f64, frame.height() as f64);
    let target = f64::from(target_size);

    let scale = (target / fw).min(target / fh);
    let scaled_w = (fw * scale).round() as u32;
    let scaled_h = (fh * scale).round() as u32;
    let pad_x = (target_size - scaled_w) / 2;
    let pad_y = (target_size - scaled_h) / 2;

    // Pad with 114/255 gray, YOLO convention
    let side = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, side, side), 114.0 / 255.0);

    let src = frame.as_ndarray(); // [H, W, C] u8
    let last_row = frame.height() as usize - 1;
    let last_col = frame.width() as usize - 1;

    // Nearest-neighbor resize into the padded region
    for dy in 0..scaled_h as usize {
        let sy = ((dy as f64 / scale) as usize).min(last_row);
        let out_y = pad_y as usize + dy;
        for dx in 0..scaled_w as usize {
            let sx = ((dx as f64 / scale) as usize).min(last_col);
            let out_x = pad_x as usize + dx;
            for c in 0..3 {
                tensor[[0, c, out_y, out_x]] = f32::from(src[[sy, sx, c]]) / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parses a raw YOLOv8 output buffer into frame-space detections.
///
/// Each row is `[cx, cy, w, h, class scores...]` in letterbox space.
/// The best-scoring class wins; rows below the candidate threshold are
/// dropped before NMS.
fn decode_output(
    data: &[f32],
    num_dets: usize,
    num_feats: usize,
    transposed: bool,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Vec<Detection> {
    if num_feats < 5 {
        return Vec::new();
    }
    let num_classes = num_feats - 4;

    let mut detections = Vec::new();
    for i in 0..num_dets {
        let feat = |f: usize| {
            if transposed {
                data[f * num_dets + i]
            } else {
                data[i * num_feats + f]
            }
        };

        let mut class_id = 0usize;
        let mut best_score = feat(4);
        for c in 1..num_classes {
            let score = feat(4 + c);
            if score > best_score {
                best_score = score;
                class_id = c;
            }
        }

        let confidence = best_score as f64;
        if confidence < CANDIDATE_THRESHOLD {
            continue;
        }

        let cx = feat(0) as f64;
        let cy = feat(1) as f64;
        let w = feat(2) as f64;
        let h = feat(3) as f64;

        // Map letterbox coords back to original frame coords
        let x1 = ((cx - w / 2.0) - pad_x as f64) / scale;
        let y1 = ((cy - h / 2.0) - pad_y as f64) / scale;
        let x2 = ((cx + w / 2.0) - pad_x as f64) / scale;
        let y2 = ((cy + h / 2.0) - pad_y as f64) / scale;

        detections.push(Detection {
            class_id,
            confidence,
            x1,
            y1,
            x2,
            y2,
        });
    }
    detections
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy class-aware NMS: walk candidates in confidence order, dropping
/// any that overlap an already kept box of the same class.
fn nms(mut dets: Vec<Detection>, iou_thresh: f64) -> Vec<Detection> {
    dets.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::new();
    for det in dets {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && iou(k, &det) > iou_thresh);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}

fn iou(a: &Detection, b: &Detection) -> f64 {
    let overlap_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let overlap_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = overlap_w * overlap_h;
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
