/// Extract text from PDF bytes using pdf-extract on a blocking thread.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, String> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| format!("PDF extraction failed: {e}"))
    })
    .await
    .map_err(|e| format!("PDF extraction task failed: {e}"))?
}
