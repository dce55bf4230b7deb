#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("s3 download failed for key {key}: {source}")]
    Download {
        key: String,
        #[source]
        source: aws_sdk_s3::error::SdkError<
            aws_sdk_s3::operation::get_object::GetObjectError,
        >,
    },
    #[error("failed to read object body: {0}")]
    Body(#[from] aws_sdk_s3::primitives::ByteStreamError),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt dataset archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("malformed submission csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("submission csv missing required column '{0}'")]
    MissingColumn(&'static str),
}
