pub mod balance;
pub mod connect;
pub mod disconnect;
pub mod help;
pub mod transfer;

pub use balance::BalanceCommand;
pub use connect::ConnectCommand;
pub use disconnect::DisconnectCommand;
pub use help::HelpCommand;
pub use transfer::TransferCommand;
