//! `face`: upload a capture for verification

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use turnstile_client::HttpFaceVerifier;
use turnstile_credential::{FaceImage, FaceVerifier, SubjectId, VerificationStatus};

use crate::EXIT_DENIED;
use crate::settings::Settings;

/// Arguments for `turnstile face`
#[derive(Debug, Args)]
pub struct FaceArgs {
    /// Subject the capture is checked against
    #[arg(long, value_name = "ID")]
    pub subject: String,

    /// Path to the captured image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(settings: &Settings, args: FaceArgs) -> Result<ExitCode> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("reading {}", args.image.display()))?;
    let image = image_from_path(&args.image, bytes);

    let verifier = HttpFaceVerifier::new(settings.api_client()?);
    let report = verifier
        .verify(&SubjectId::from(args.subject.as_str()), image)
        .await
        .context("verifying capture")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match report.status {
            VerificationStatus::Accepted => println!("accepted: {}", report.message),
            VerificationStatus::Rejected => println!("rejected: {}", report.message),
            VerificationStatus::Pending => println!("pending: {}", report.message),
        }
    }

    Ok(if report.is_accepted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DENIED)
    })
}

/// Pick upload metadata from the file extension; the service expects JPEG
fn image_from_path(path: &Path, bytes: Vec<u8>) -> FaceImage {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("face.jpg")
        .to_owned();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => {
            FaceImage::new(bytes, file_name, "image/png")
        }
        _ => FaceImage::new(bytes, file_name, "image/jpeg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_selects_the_mime_type() {
        let png = image_from_path(Path::new("capture.PNG"), vec![1]);
        assert_eq!(png.mime_type(), "image/png");

        let jpg = image_from_path(Path::new("selfie.jpg"), vec![1]);
        assert_eq!(jpg.mime_type(), "image/jpeg");
        assert_eq!(jpg.file_name(), "selfie.jpg");

        let bare = image_from_path(Path::new("capture"), vec![1]);
        assert_eq!(bare.mime_type(), "image/jpeg");
    }
}
