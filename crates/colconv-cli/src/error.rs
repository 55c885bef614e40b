use colconv_core::ConvertError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CliError {
    #[snafu(display("{source}"))]
    Config { source: ConvertError },

    #[snafu(display("Failed to start the async runtime: {source}"))]
    Runtime { source: std::io::Error },
}

impl From<ConvertError> for CliError {
    fn from(source: ConvertError) -> Self {
        CliError::Config { source }
    }
}
