// Unit tests for Face Compare public helpers

use face_compare::core::normalize::{normalize_file, to_rgb_square, DEFAULT_SIZE};
use face_compare::models::{CompareFacesRequest, ComparisonResponse, PercentagePolicy, VerificationResult};
use face_compare::{format_result, percentage_match};
use validator::Validate;

#[test]
fn test_percentage_matches_rounded_similarity() {
    for distance in [0.0, 0.05, 0.333, 0.5, 0.999, 1.0, 1.42, 2.0] {
        let similarity = 1.0 - distance;
        let expected = format!("{}%", ((similarity * 100.0_f64).round_ties_even()) as i64);
        assert_eq!(percentage_match(similarity, PercentagePolicy::Raw), expected);
    }
}

#[test]
fn test_response_serializes_public_field_names() {
    let response = format_result(&VerificationResult::new(true, 0.13), PercentagePolicy::Raw);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["matched"], true);
    assert_eq!(json["distance"], 0.13);
    assert_eq!(json["similarity"], 1.0 - 0.13);
    assert_eq!(json["percentageMatch"], "87%");
    assert_eq!(json.as_object().unwrap().len(), 4);
}

#[test]
fn test_response_round_trips() {
    let response = format_result(&VerificationResult::new(false, 1.1), PercentagePolicy::Raw);
    let json = serde_json::to_string(&response).unwrap();
    let back: ComparisonResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(back.matched, response.matched);
    assert_eq!(back.distance, 1.1);
    assert!((back.similarity - response.similarity).abs() < 1e-12);
    assert_eq!(back.percentage_match, "-10%");
}

#[test]
fn test_request_requires_both_urls() {
    let empty: CompareFacesRequest = serde_json::from_str("{}").unwrap();
    assert!(empty.validate().is_err());

    let one: CompareFacesRequest = serde_json::from_str(r#"{"image1Url": "http://x/1.jpg"}"#).unwrap();
    assert!(one.validate().is_err());
}

#[test]
fn test_normalize_is_idempotent_on_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    image::RgbImage::from_pixel(500, 300, image::Rgb([10, 20, 30])).save(&path).unwrap();

    normalize_file(&path, DEFAULT_SIZE).unwrap();
    normalize_file(&path, DEFAULT_SIZE).unwrap();

    let out = image::ImageReader::open(&path).unwrap().with_guessed_format().unwrap().decode().unwrap();
    assert_eq!((out.width(), out.height()), (DEFAULT_SIZE, DEFAULT_SIZE));
}

#[test]
fn test_to_rgb_square_upscales() {
    let tiny = image::DynamicImage::ImageRgba8(image::RgbaImage::new(2, 2));
    let out = to_rgb_square(&tiny, DEFAULT_SIZE);
    assert_eq!((out.width(), out.height()), (224, 224));
}
