//! Subcommands of the `slick-reporter` binary.
//! `slick-reporter` 二进制的子命令。

pub mod init;
pub mod run;
