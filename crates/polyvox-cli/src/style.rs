use console::style;

pub const HELP_TEMPLATE: &str = r#"
{before-help}{name} {version}
{about-with-newline}
{usage-heading}
{tab}{usage}

{all-args}{after-help}
"#;

pub const BANNER: &str = r#"
 ___  ___  _ __   ___   _____ __
| _ \/ _ \| |\ \ / / | / / _ \\ \/
|  _/ (_) | |_\ V /| |/ / (_) |>  <
|_|  \___/|____|_|  |___/\___//_/\_\  23-language speech with voice cloning
"#;

/// Theme for styled terminal output
#[derive(Clone)]
pub struct Theme {
    pub accent: fn(&str) -> console::StyledObject<&str>,
    pub success: fn(&str) -> console::StyledObject<&str>,
    pub error: fn(&str) -> console::StyledObject<&str>,
    pub warning: fn(&str) -> console::StyledObject<&str>,
    pub info: fn(&str) -> console::StyledObject<&str>,
    pub muted: fn(&str) -> console::StyledObject<&str>,
    pub no_color: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: |s| style(s).cyan().bold(),
            success: |s| style(s).green().bold(),
            error: |s| style(s).red().bold(),
            warning: |s| style(s).yellow(),
            info: |s| style(s).blue(),
            muted: |s| style(s).dim(),
            no_color: false,
        }
    }
}

impl Theme {
    pub fn no_color() -> Self {
        Self {
            accent: |s| style(s),
            success: |s| style(s),
            error: |s| style(s),
            warning: |s| style(s),
            info: |s| style(s),
            muted: |s| style(s),
            no_color: true,
        }
    }

    pub fn print_banner(&self) {
        if self.no_color {
            println!("{}", BANNER.trim_start_matches('\n'));
        } else {
            println!("{}", (self.accent)(BANNER.trim_start_matches('\n')));
        }
    }

    pub fn success(&self, msg: &str) {
        println!("{} {}", (self.success)("✓"), msg);
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", (self.error)("✗"), msg);
    }

    pub fn warning(&self, msg: &str) {
        println!("{} {}", (self.warning)("⚠"), msg);
    }

    pub fn info(&self, msg: &str) {
        println!("{} {}", (self.info)("ℹ"), msg);
    }

    pub fn muted(&self, msg: &str) {
        println!("{}", (self.muted)(msg));
    }

    pub fn step(&self, n: usize, total: usize, msg: &str) {
        println!("{} {}", (self.accent)(&format!("[{}/{}]", n, total)), msg);
    }
}

/// Per-chunk narration progress
pub fn chunk_progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("#>-")
}

pub fn spinner_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
}
