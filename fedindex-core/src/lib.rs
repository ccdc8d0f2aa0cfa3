use colored::Colorize;

pub mod crawl;
pub mod report;

const BANNER: &str = r#"
  __         _ _           _
 / _|___  __| (_)_ __   __| | _____  __
| |_/ _ \/ _` | | '_ \ / _` |/ _ \ \/ /
|  _  __/ (_| | | | | | (_| |  __/>  <
|_|  \___|\__,_|_|_| |_|\__,_|\___/_/\_\
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "federated instance index".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
