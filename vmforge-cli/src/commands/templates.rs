//! `list-templates` command handler

use anyhow::{Context, Result};
use colored::*;
use vmforge_core::domain::object::{ObjectKind, PlatformObject};

use crate::commands::{Session, build_client};

pub async fn handle_list_templates(session: &Session) -> Result<()> {
    let client = build_client(session)?;

    let templates = client
        .find_objects(ObjectKind::Template, None)
        .await
        .context("failed to list templates")?;

    if templates.is_empty() {
        println!("{}", "No templates found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} template(s):", templates.len()).bold()
    );
    println!();
    for template in templates {
        print_template_summary(&template);
    }

    Ok(())
}

fn print_template_summary(template: &PlatformObject) {
    println!("  {} {}", "▸".cyan(), template.name_label.bold());
    println!("    Id:     {}", template.id.to_string().dimmed());
    println!(
        "    CPUs:   {}",
        template
            .cpus
            .map_or_else(|| "-".to_string(), |n| n.to_string())
    );
    println!("    Memory: {}", format_memory(template.memory_bytes));
    println!();
}

fn format_memory(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) => format!("{:.1} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0)),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_formats_as_gib() {
        assert_eq!(format_memory(Some(2 * 1024 * 1024 * 1024)), "2.0 GiB");
        assert_eq!(format_memory(Some(1610612736)), "1.5 GiB");
        assert_eq!(format_memory(None), "-");
    }
}
