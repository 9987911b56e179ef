use thiserror::Error;

/// Errors the bot is allowed to show to a chat user as-is. Everything else is
/// logged and replaced with [`GENERIC_APOLOGY`] at the dispatch boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),

    #[error("Uh-oh! It seems like you missed out on something important - your wallet connection! \nTo connect your wallet, please use this format: /connect \u{201c}your wallet address\"")]
    NoVerifiedAccount,

    #[error("Hmm.. I'm having trouble recognizing the token symbol you entered, are you sure you have that specific token in your wallet? Please double check and try again.")]
    NoTokenFound,

    #[error("I see you own multiple {symbol} tokens in your Superhero Wallet. Please reply with the number of the option you want to transfer from:{listing}")]
    MultipleTokensFound { symbol: String, listing: String },

    #[error("Oops, it looks like there might be a tiny hiccup. It appears there are insufficient funds in your wallet. Go and top up your wallet, and then come back and give the command another go!")]
    InsufficientFunds,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    UserFacing(#[from] UserError),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(String),

    #[error("external service error: {0}")]
    External(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fallback reply for any error that is not a [`UserError`].
pub const GENERIC_APOLOGY: &str =
    "Ops, looks like something went wrong. Please try again and if it does not work, ask the team for some help.";
