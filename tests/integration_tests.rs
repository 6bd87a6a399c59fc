//! Integration tests for the input pipeline

use resume_fit::input::InputManager;
use resume_fit::processing::document::DocumentRole;
use resume_fit::EngineError;
use std::path::Path;

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let result = manager.extract_text(path).await;
    assert!(result.is_ok());

    let text = result.unwrap();
    assert!(text.contains("John Doe"));
    assert!(text.contains("Software Engineer"));
    assert!(text.contains("React"));
    assert!(text.contains("Node.js"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.md");

    let result = manager.extract_text(path).await;
    assert!(result.is_ok());

    let text = result.unwrap();
    assert!(text.contains("John Doe"));
    assert!(text.contains("Software Engineer"));
    assert!(text.contains("React"));
    assert!(text.contains("Node.js"));
    // Should not contain markdown formatting
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    // First extraction
    let text1 = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    // Second extraction should use cache
    let text2 = manager.extract_text(path).await.unwrap();
    assert_eq!(text1, text2);
    assert_eq!(manager.cache_size(), 1);

    manager.clear_cache();
    assert_eq!(manager.cache_size(), 0);
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/unsupported.xyz");

    let result = manager.extract_text(path).await;
    assert!(matches!(result, Err(EngineError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_nonexistent_file() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/nonexistent.txt");

    let result = manager.extract_text(path).await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn test_load_document_detects_sections() {
    let mut manager = InputManager::new().with_cache(false);

    let resume = manager
        .load_document(Path::new("tests/fixtures/sample_resume.txt"), DocumentRole::Resume)
        .await
        .unwrap();
    assert_eq!(resume.id(), "sample_resume");
    assert_eq!(resume.role(), DocumentRole::Resume);
    for section in ["summary", "experience", "skills", "education"] {
        assert!(resume.sections().contains_key(section), "missing {}", section);
    }

    let job = manager
        .load_document(Path::new("tests/fixtures/sample_job.txt"), DocumentRole::Job)
        .await
        .unwrap();
    let requirements = job.sections()["requirements"].clone();
    assert!(job.text()[requirements].contains("Strong Python and SQL"));
    assert!(job.sections().contains_key("preferred"));
    assert_eq!(manager.cache_size(), 0);
}
