//! Dual-classifier image heuristic
//!
//! Used when no vision-capable model is reachable. Blends three factors:
//! - 40% confidence of the top classification
//! - 30% agreement between two independent classifiers
//! - 30% crude quality estimate from resolution and aspect ratio

use serde::{Deserialize, Serialize};

use crate::{is_verified_score, ClassLabel, VerificationResult, MAX_SCORE};

/// Model label reported for classifier-based image verdicts
pub const IMAGE_FALLBACK_MODEL: &str = "ViT + Swin image classifiers (fallback)";

const CLASSIFICATION_WEIGHT: f64 = 0.4;
const AGREEMENT_WEIGHT: f64 = 0.3;
const QUALITY_WEIGHT: f64 = 0.3;

/// Labels compared between the two classifiers
const AGREEMENT_DEPTH: usize = 3;

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

/// Factors behind an image authenticity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageVerdict {
    /// Final score (0 - 100)
    pub authenticity_score: u8,
    /// Top label of the primary classifier
    pub top_label: String,
    /// Top classification confidence (0 - 100)
    pub classification_confidence: f64,
    /// Agreement between classifiers (0 - 100)
    pub model_agreement: f64,
    /// Resolution/aspect estimate (0 - 100)
    pub image_quality: f64,
}

impl ImageVerdict {
    pub fn is_verified(&self) -> bool {
        is_verified_score(self.authenticity_score)
    }
}

/// Overlap of the top labels plus joint top confidence, clamped to 0 - 100
pub fn model_agreement(classification: &[ClassLabel], manipulation: &[ClassLabel]) -> f64 {
    let (Some(first), Some(second)) = (classification.first(), manipulation.first()) else {
        return 0.0;
    };

    let left: Vec<String> = classification
        .iter()
        .take(AGREEMENT_DEPTH)
        .map(|c| c.label.to_lowercase())
        .collect();
    let right: Vec<String> = manipulation
        .iter()
        .take(AGREEMENT_DEPTH)
        .map(|c| c.label.to_lowercase())
        .collect();

    let mut overlap = 0usize;
    for a in &left {
        for b in &right {
            if a.contains(b.as_str()) || b.contains(a.as_str()) {
                overlap += 1;
            }
        }
    }

    let overlap_score = overlap as f64 / AGREEMENT_DEPTH as f64 * 100.0;
    let joint_confidence = first.score * second.score * 100.0;

    // Several labels can overlap the same label, so the blend may pass 100
    (overlap_score * 0.7 + joint_confidence * 0.3).clamp(0.0, 100.0)
}

/// Resolution and aspect-ratio estimate (0 - 100)
pub fn estimate_quality(dimensions: Option<ImageDimensions>) -> f64 {
    let pixels = dimensions
        .map(|d| d.width as f64 * d.height as f64)
        .unwrap_or(0.0);
    let resolution = (pixels / 10_000.0).clamp(0.0, 100.0);

    let aspect = match dimensions.and_then(|d| d.aspect_ratio()) {
        Some(ratio) if ratio > 0.5 && ratio < 2.0 => 100.0,
        _ => 70.0,
    };

    resolution * 0.7 + aspect * 0.3
}

/// Blend both classifier outputs and the image size into a score
pub fn score_image(
    classification: &[ClassLabel],
    manipulation: &[ClassLabel],
    dimensions: Option<ImageDimensions>,
) -> ImageVerdict {
    let top = classification.first();
    let classification_confidence = top.map(|c| c.score * 100.0).unwrap_or(0.0);
    let agreement = model_agreement(classification, manipulation);
    let quality = estimate_quality(dimensions);

    let raw = classification_confidence * CLASSIFICATION_WEIGHT
        + agreement * AGREEMENT_WEIGHT
        + quality * QUALITY_WEIGHT;

    ImageVerdict {
        authenticity_score: raw.round().clamp(0.0, MAX_SCORE as f64) as u8,
        top_label: top.map(|c| c.label.clone()).unwrap_or_else(|| "unknown".to_string()),
        classification_confidence,
        model_agreement: agreement,
        image_quality: quality,
    }
}

/// Render an image verdict as a verification result
pub fn image_result(verdict: &ImageVerdict, model: &str) -> VerificationResult {
    let score = verdict.authenticity_score;
    let confidence = verdict.classification_confidence.round() as u32;

    let explanation = if verdict.is_verified() {
        let quality = if score > 85 {
            "The image has high quality indicators and clear content recognition patterns."
        } else {
            "The image shows reasonable quality indicators, though additional verification wouldn't hurt."
        };
        format!(
            "This appears to be an authentic image of {} ({}% confidence). {}",
            verdict.top_label, confidence, quality
        )
    } else {
        let caution = if score < 50 {
            "Multiple indicators suggest this image may be manipulated or synthetically generated."
        } else {
            "Some quality indicators suggest caution when sharing or relying on this image."
        };
        format!(
            "This image was classified as {}, but with lower confidence ({}%). {}",
            verdict.top_label, confidence, caution
        )
    };

    VerificationResult::from_score(score, model, explanation)
}

/// Read pixel dimensions from a PNG, GIF, JPEG or WebP header
pub fn sniff_dimensions(bytes: &[u8]) -> Option<ImageDimensions> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        if bytes.get(12..16)? != b"IHDR" {
            return None;
        }
        return Some(ImageDimensions::new(be_u32(bytes, 16)?, be_u32(bytes, 20)?));
    }

    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(ImageDimensions::new(
            le_u16(bytes, 6)? as u32,
            le_u16(bytes, 8)? as u32,
        ));
    }

    if bytes.starts_with(&[0xFF, 0xD8]) {
        return jpeg_dimensions(bytes);
    }

    if bytes.get(0..4)? == b"RIFF" && bytes.get(8..12)? == b"WEBP" {
        return webp_dimensions(bytes);
    }

    None
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<ImageDimensions> {
    let mut i = 2;
    while i + 1 < bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        // Fill bytes
        if marker == 0xFF {
            i += 1;
            continue;
        }
        // Standalone markers carry no length
        if marker == 0x01 || (0xD0..=0xD9).contains(&marker) {
            i += 2;
            continue;
        }
        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let height = be_u16(bytes, i + 5)? as u32;
            let width = be_u16(bytes, i + 7)? as u32;
            return Some(ImageDimensions::new(width, height));
        }
        let length = be_u16(bytes, i + 2)? as usize;
        i += 2 + length;
    }
    None
}

fn webp_dimensions(bytes: &[u8]) -> Option<ImageDimensions> {
    match bytes.get(12..16)? {
        b"VP8 " => Some(ImageDimensions::new(
            (le_u16(bytes, 26)? & 0x3FFF) as u32,
            (le_u16(bytes, 28)? & 0x3FFF) as u32,
        )),
        b"VP8L" => {
            let bits = u32::from_le_bytes(bytes.get(21..25)?.try_into().ok()?);
            Some(ImageDimensions::new(
                (bits & 0x3FFF) + 1,
                ((bits >> 14) & 0x3FFF) + 1,
            ))
        }
        b"VP8X" => Some(ImageDimensions::new(le_u24(bytes, 24)? + 1, le_u24(bytes, 27)? + 1)),
        _ => None,
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn le_u24(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 3)?;
    Some(b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16)
}
