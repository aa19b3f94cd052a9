//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use crate::flavors::{FlavorDetails, FlavorSummary};
use crate::gitops::{ClusterChange, PublishOutcome};
use crate::service::{
    DefaultsResponse, Generation, SitesResponse, VendorsResponse, VersionsResponse,
};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No resources found.\n".to_string();
    }

    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            output.push_str("   ");
        }
        output.push_str(&format!(
            "{:width$}",
            header.to_uppercase(),
            width = widths[i]
        ));
    }
    output.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                output.push_str("   ");
            }
            if i < widths.len() {
                output.push_str(&format!("{:width$}", cell, width = widths[i]));
            } else {
                output.push_str(cell);
            }
        }
        output.push('\n');
    }

    output
}

// ============================================================================
// Catalogue display
// ============================================================================

pub fn format_vendors(vendors: &VendorsResponse) -> String {
    let rows = vendors
        .vendors
        .iter()
        .map(|v| vec![v.name.clone(), v.display_name.clone()])
        .collect();
    format_table(&["NAME", "DISPLAY NAME"], rows)
}

/// Version list with the default marked `*`
pub fn format_versions(versions: &VersionsResponse) -> String {
    let rows = versions
        .versions
        .iter()
        .map(|v| {
            vec![
                if *v == versions.default { "*" } else { " " }.to_string(),
                v.clone(),
            ]
        })
        .collect();
    format_table(&["", "VERSION"], rows)
}

pub fn format_sites(sites: &SitesResponse) -> String {
    let rows = sites.sites.iter().map(|s| vec![s.clone()]).collect();
    format_table(&["SITE"], rows)
}

pub fn format_defaults(defaults: &DefaultsResponse) -> String {
    let mut output = String::new();

    let default_version = defaults
        .versions
        .iter()
        .find(|v| v.is_default)
        .map(|v| v.version.as_str())
        .unwrap_or("-");
    let max_pods: Vec<String> = defaults
        .max_pods_options
        .iter()
        .map(|m| m.to_string())
        .collect();

    output.push_str(&format!("OCP Version:  {}\n", default_version));
    output.push_str(&format!("DNS Domain:   {}\n", defaults.default_dns_domain));
    output.push_str(&format!("Max Pods:     {}\n", max_pods.join(", ")));

    output.push_str("\nDefault Configs:\n");
    for config in &defaults.default_configs {
        output.push_str(&format!("  - {}\n", config));
    }

    output.push_str("\nOptional Configs:\n");
    for config in &defaults.optional_configs {
        output.push_str(&format!("  - {} ({})\n", config.name, config.description));
    }

    output
}

// ============================================================================
// Flavor display
// ============================================================================

pub fn format_flavor_list(flavors: &[FlavorSummary]) -> String {
    let rows = flavors
        .iter()
        .map(|f| vec![f.key.clone(), f.name.clone(), f.description.clone()])
        .collect();
    format_table(&["KEY", "NAME", "DESCRIPTION"], rows)
}

pub fn format_flavor_details(details: &FlavorDetails) -> String {
    let mut output = String::new();

    output.push_str(&format!("Name:          {}\n", details.name));
    output.push_str(&format!("Key:           {}\n", details.key));
    output.push_str(&format!("Description:   {}\n", details.description));
    output.push_str(&format!("OCP Version:   {}\n", details.ocp_version));
    output.push_str(&format!("Max Pods:      {}\n", details.max_pods));
    output.push_str(&format!("Total Nodes:   {}\n", details.total_nodes));

    output.push_str("Vendors:\n");
    for vendor in &details.vendors {
        output.push_str(&format!("  {} ({} nodes)\n", vendor.vendor, vendor.nodes));
    }

    let mut flags = Vec::new();
    if details.high_density {
        flags.push("high-density");
    }
    if details.includes_var_lib_containers {
        flags.push("var-lib-containers");
    }
    if details.includes_ringsize {
        flags.push("ringsize");
    }
    if !flags.is_empty() {
        output.push_str(&format!("Flags:         {}\n", flags.join(", ")));
    }

    if !details.custom_configs.is_empty() {
        output.push_str("Custom Configs:\n");
        for config in &details.custom_configs {
            output.push_str(&format!("  - {}\n", config));
        }
    }

    output
}

// ============================================================================
// Generation display
// ============================================================================

/// Header printed above a previewed document
pub fn format_generation_summary(generation: &Generation) -> String {
    let input = &generation.input;
    let vendors: Vec<String> = input
        .vendor_configs
        .iter()
        .map(|vc| format!("{} x{}", vc.vendor, vc.number_of_nodes))
        .collect();

    let mut output = String::new();
    output.push_str(&format!("# Cluster:     {}\n", input.cluster_name));
    output.push_str(&format!("# Site:        {}\n", input.site));
    output.push_str(&format!("# OCP Version: {}\n", input.ocp_version));
    output.push_str(&format!("# Max Pods:    {}\n", input.max_pods.value()));
    output.push_str(&format!("# Vendors:     {}\n", vendors.join(", ")));
    output.push_str(&format!("# Nodepools:   {}\n", generation.nodepool_count()));
    output
}

pub fn format_publish_plan(change: &ClusterChange) -> String {
    let mut output = String::new();
    output.push_str("Dry run: nothing written\n");
    output.push_str(&format!("  Branch: {}\n", change.branch));
    output.push_str(&format!("  File:   {}\n", change.relative_path.display()));
    output.push_str(&format!("  Author: {} <{}>\n", change.author.name, change.author.email));
    output.push_str("  Message:\n");
    for line in change.message.lines() {
        output.push_str(&format!("    {}\n", line));
    }
    output
}

pub fn format_publish_outcome(outcome: &PublishOutcome) -> String {
    let mut output = String::new();
    output.push_str(&format!("Committed {}\n", outcome.file_path));
    output.push_str(&format!("  Branch: {}\n", outcome.branch));
    output.push_str(&format!("  Commit: {}\n", outcome.commit_id));
    output.push_str(&format!(
        "  Pushed: {}\n",
        if outcome.pushed { "yes" } else { "no" }
    ));
    output
}
