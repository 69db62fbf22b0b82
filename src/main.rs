use clap::Parser;
use eco_ci_collector::runner::{CollectArgsBuilder, ConfigRules, run_collect};
use std::path::PathBuf;

/// Download Eco-CI energy measurements from GitHub Actions artifacts and
/// consolidate them into one CSV file.
#[derive(Parser, Clone)]
#[command(version)]
struct Args {
    /// GitHub token used as bearer credential
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository to collect from (owner/name)
    #[arg(long, env = "GITHUB_REPO")]
    repo: Option<String>,

    /// Output CSV path
    #[arg(short, long, default_value = "results/raw_data.csv")]
    output: PathBuf,

    /// GitHub API base URL (for GitHub Enterprise Server)
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    api_url: String,

    /// Case-insensitive substring identifying Eco-CI artifacts
    #[arg(long, default_value = "eco-ci")]
    marker: String,

    /// Branch prefix to config label rules, checked in order
    /// (format: prefix:label,prefix2:label2). Replaces the built-in table.
    #[arg(long)]
    branch_map: Option<String>,

    /// Workflow file to config label rules (format: file:label,file2:label2).
    /// Replaces the built-in table.
    #[arg(long)]
    workflow_map: Option<String>,

    /// Give up after this many consecutive rate-limited responses
    /// (default: wait for as long as GitHub asks)
    #[arg(long)]
    max_rate_limit_retries: Option<u32>,

    /// Quiet mode - minimal output, only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Missing credentials are reported plainly and exit 1
    let (token, repo) = match cli::require(args.token.clone(), args.repo.clone()) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if args.quiet {
        EnvFilter::new("eco_ci_collector=warn")
    } else {
        EnvFilter::new("eco_ci_collector=info")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let branch_rules = args
        .branch_map
        .as_deref()
        .map(cli::parse_label_mapping)
        .transpose()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse branch mapping: {}\n\
                 Example: --branch-map \"experiment/c1:C1,experiment/c2:C2\"",
                e
            )
        })?;
    let workflow_rules = args
        .workflow_map
        .as_deref()
        .map(cli::parse_label_mapping)
        .transpose()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse workflow mapping: {}\n\
                 Example: --workflow-map \"tests.yml:C1,ci-consolidated.yml:C3\"",
                e
            )
        })?;

    if !args.quiet {
        println!("Eco-CI Collector");
        println!("================");
        println!("Repository: {}", repo.trim());
        println!("Output: {}", args.output.display());
        println!();
    }

    let collect_args = CollectArgsBuilder::default()
        .token(token)
        .repo(repo)
        .api_url(args.api_url)
        .output_path(args.output)
        .marker(args.marker)
        .rules(ConfigRules::with_overrides(branch_rules, workflow_rules))
        .max_rate_limit_retries(args.max_rate_limit_retries)
        .build()?;

    let result = run_collect(collect_args).await?;

    let Some(output_path) = result.output_path else {
        println!();
        println!("No data collected. Have the workflows been triggered yet?");
        return Ok(());
    };

    println!();
    println!("Collection Summary");
    println!("==================");
    for line in result.stats.summary_lines() {
        println!("{}", line);
    }
    println!("Duration: {:.2}s", result.duration.as_secs_f64());
    println!();
    println!(
        "Wrote {} rows to {}",
        result.rows_written,
        output_path.display()
    );

    Ok(())
}

/// CLI utility functions for parsing command-line arguments
mod cli {
    use std::collections::HashSet;

    /// Resolve the token and repository, treating blank values as unset
    pub fn require(
        token: Option<String>,
        repo: Option<String>,
    ) -> anyhow::Result<(String, String)> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("ERROR: GITHUB_TOKEN environment variable not set."))?;
        let repo = repo
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("ERROR: GITHUB_REPO environment variable not set."))?;
        Ok((token, repo))
    }

    /// Parse a label mapping string "key:label,key2:label2", keeping order
    pub fn parse_label_mapping(mapping_str: &str) -> anyhow::Result<Vec<(String, String)>> {
        let mut mappings = Vec::new();
        let mut seen = HashSet::new();

        if mapping_str.trim().is_empty() {
            return Ok(mappings);
        }

        for pair in mapping_str.split(',') {
            let parts: Vec<&str> = pair.trim().split(':').collect();
            if parts.len() != 2 {
                return Err(anyhow::anyhow!(
                    "Invalid mapping format '{}'. Expected format: 'key:label,key2:label2'",
                    pair
                ));
            }

            let key = parts[0].trim();
            let label = parts[1].trim();

            if key.is_empty() || label.is_empty() {
                return Err(anyhow::anyhow!(
                    "Keys and labels cannot be empty in mapping '{}'",
                    pair
                ));
            }

            if !seen.insert(key.to_string()) {
                return Err(anyhow::anyhow!("Duplicate key '{}' in mapping", key));
            }

            mappings.push((key.to_string(), label.to_string()));
        }

        Ok(mappings)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_require_both_present() {
            let (token, repo) =
                require(Some("ghp_abc".to_string()), Some("jdoe/study".to_string())).unwrap();
            assert_eq!(token, "ghp_abc");
            assert_eq!(repo, "jdoe/study");
        }

        #[test]
        fn test_require_missing_token() {
            let err = require(None, Some("jdoe/study".to_string())).unwrap_err();
            assert_eq!(
                err.to_string(),
                "ERROR: GITHUB_TOKEN environment variable not set."
            );
        }

        #[test]
        fn test_require_missing_repo() {
            let err = require(Some("ghp_abc".to_string()), None).unwrap_err();
            assert_eq!(
                err.to_string(),
                "ERROR: GITHUB_REPO environment variable not set."
            );
        }

        #[test]
        fn test_require_whitespace_counts_as_missing() {
            let err = require(Some("  \n".to_string()), Some("jdoe/study".to_string())).unwrap_err();
            assert!(err.to_string().contains("GITHUB_TOKEN"));

            let err = require(Some("ghp_abc".to_string()), Some("   ".to_string())).unwrap_err();
            assert!(err.to_string().contains("GITHUB_REPO"));
        }

        #[test]
        fn test_require_reports_token_first() {
            let err = require(None, None).unwrap_err();
            assert!(err.to_string().contains("GITHUB_TOKEN"));
        }

        #[test]
        fn test_parse_mapping_keeps_order() {
            let mapping =
                parse_label_mapping("experiment/c2-pip-cache:C2, experiment/c1-baseline:C1")
                    .unwrap();
            assert_eq!(
                mapping,
                vec![
                    ("experiment/c2-pip-cache".to_string(), "C2".to_string()),
                    ("experiment/c1-baseline".to_string(), "C1".to_string()),
                ]
            );
        }

        #[test]
        fn test_parse_mapping_empty() {
            assert!(parse_label_mapping("  ").unwrap().is_empty());
        }

        #[test]
        fn test_parse_mapping_invalid() {
            assert!(parse_label_mapping("tests.yml").is_err());
            assert!(parse_label_mapping("a:b:c").is_err());
            assert!(parse_label_mapping("tests.yml:").is_err());
            assert!(parse_label_mapping(":C1").is_err());
        }

        #[test]
        fn test_parse_mapping_duplicate_key() {
            assert!(parse_label_mapping("tests.yml:C1,tests.yml:C2").is_err());
        }
    }
}
