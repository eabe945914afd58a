//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::{Identity, SessionState};
use crate::gate::{evaluate, Decision, RouteTable};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a gate decision as a colored string
pub fn format_decision(decision: &Decision) -> String {
    let text = decision.to_string();
    match decision {
        Decision::Render => text.green().to_string(),
        Decision::RedirectToLogin => text.yellow().to_string(),
        Decision::RedirectTo(_) => text.red().to_string(),
        Decision::Pending => text,
    }
}

fn decision_color(decision: &Decision) -> Color {
    match decision {
        Decision::Render => Color::Green,
        Decision::RedirectToLogin => Color::Yellow,
        Decision::RedirectTo(_) => Color::Red,
        Decision::Pending => Color::Reset,
    }
}

/// Print the signed-in identity
pub fn print_identity(identity: &Identity) {
    println!("{}", "Signed in".bold().underline());
    println!();
    println!("  {} {}", "Name:".bold(), identity.name);
    println!("  {} {}", "ID:".bold(), identity.id);
    println!("  {} {}", "Role:".bold(), identity.role.to_string().cyan());

    let optional = [
        ("Email:", &identity.email),
        ("Phone:", &identity.phone),
        ("Department:", &identity.department),
        ("Specialization:", &identity.specialization),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("  {} {}", label.bold(), value);
        }
    }
}

/// Print the route table with the decision for the given state
pub fn print_route_table(routes: &RouteTable, state: &SessionState) {
    if routes.is_empty() {
        info("No routes configured");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Path").fg(Color::Cyan),
            Cell::new("Access").fg(Color::Cyan),
            Cell::new("You").fg(Color::Cyan),
        ]);

    for route in routes.routes() {
        let access = match route.policy() {
            None => "public".to_string(),
            Some(policy) if policy.allowed_roles.is_empty() => "signed in".to_string(),
            Some(policy) => policy.allowed_roles.to_string(),
        };
        let decision = evaluate(state, route.policy());

        table.add_row(vec![
            Cell::new(route.pattern()),
            Cell::new(access),
            Cell::new(decision.to_string()).fg(decision_color(&decision)),
        ]);
    }

    println!("{table}");
}
