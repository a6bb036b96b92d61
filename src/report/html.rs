//! HTML comparison table
//!
//! Renders the report as one table, one row per package. Adjacent Fedora
//! cells carrying the same version are merged, and the upstream cell is
//! colored by comparing the MBI build against it.

use std::cmp::Ordering;
use std::fmt::Write;

use quick_xml::escape::escape;

use crate::report::{PackageEntry, Report};
use crate::version::compare_versions;

/// Render the full HTML document.
pub fn render(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("<link rel=\"stylesheet\" href=\"mystyle.css\">\n");
    out.push_str("<table>\n<tr>\n<th>Package name</th>\n");
    for release in &report.version_columns.fedora {
        let _ = writeln!(out, "<th>{}</th>", escape(release.as_str()));
    }
    out.push_str("<th>mbi</th>\n<th>jp-bootstrap</th>\n");
    out.push_str("<th colspan=\"2\">upstream (stable)</th>\n");
    out.push_str("<th>Comment</th>\n<th>Links</th>\n</tr>\n");

    for (name, entry) in &report.versions {
        render_row(&mut out, name, entry, &report.version_columns.fedora);
    }

    out.push_str("</table>\n");
    let _ = writeln!(
        out,
        "<p>Generated on {} by {}</p>",
        escape(report.time_generated.as_str()),
        escape(report.hostname.as_str())
    );

    out
}

fn render_row(out: &mut String, name: &str, entry: &PackageEntry, releases: &[String]) {
    out.push_str("<tr>\n");
    let _ = writeln!(out, "<td>{}</td>", escape(name));

    // Fedora columns, adjacent equal versions merged into one cell
    let versions: Vec<&str> = releases
        .iter()
        .map(|release| entry.fedora.get(release).map_or("", String::as_str))
        .collect();
    let mut index = 0;
    while index < versions.len() {
        let mut colspan = 1;
        while index + colspan < versions.len()
            && compare_versions(versions[index], versions[index + colspan]) == Ordering::Equal
        {
            colspan += 1;
        }
        out.push_str("<td ");
        if colspan > 1 {
            let _ = write!(out, "colspan=\"{colspan}\" ");
        }
        let _ = writeln!(
            out,
            "class=\"fedora\">{}</td>",
            escape(versions[index + colspan - 1])
        );
        index += colspan;
    }

    let _ = writeln!(out, "<td class=\"mbi\">{}</td>", escape(entry.mbi.as_str()));
    let _ = writeln!(
        out,
        "<td class=\"mbi-bootstrap\">{}</td>",
        escape(entry.jp_bootstrap.as_str())
    );

    // Upstream cell spans both columns when there is no separate stable
    out.push_str("<td ");
    if entry.upstream.latest_stable.is_none() {
        out.push_str("colspan=\"2\" ");
    }
    let _ = writeln!(
        out,
        "class=\"{}\">{}</td>",
        upstream_class(entry),
        escape(entry.upstream.latest.as_str())
    );
    if let Some(stable) = &entry.upstream.latest_stable {
        let _ = writeln!(
            out,
            "<td class=\"{}\">{}</td>",
            stable_class(&entry.mbi, stable),
            escape(stable.as_str())
        );
    }

    let _ = writeln!(
        out,
        "<td>\n{}\n</td>",
        escape(entry.comments.comment.as_str())
    );

    out.push_str("<td>\nMBI\n");
    let _ = writeln!(
        out,
        "(<a href=\"https://src.fedoraproject.org/fork/mbi/rpms/{name}\" target=\"_blank\">dist-git</a>)",
        name = escape(name)
    );
    let _ = writeln!(
        out,
        "(<a href=\"https://koji.kjnet.xyz/koji/packageinfo?packageID={name}\" target=\"_blank\">Koji</a>)",
        name = escape(name)
    );
    let _ = writeln!(
        out,
        "(<a href=\"https://koschei.kjnet.xyz/koschei/package/{name}?collection=jp\" target=\"_blank\">Koschei</a>)",
        name = escape(name)
    );
    out.push_str("</td>\n</tr>\n");
}

/// CSS class of the upstream-latest cell. Tags from the comments file
/// override the comparison outcome.
fn upstream_class(entry: &PackageEntry) -> &'static str {
    if entry.upstream.latest.is_empty() {
        return "unknown-version";
    }
    // A pinning tag names the class directly
    for tag in ["keep-version", "correct-version"] {
        if let Some(pinned) = entry.comments.tags.get(tag)
            && compare_versions(&entry.mbi, pinned) == Ordering::Equal
        {
            return tag;
        }
    }
    match compare_versions(&entry.mbi, &entry.upstream.latest) {
        Ordering::Equal => "up-to-date",
        Ordering::Less => "downgrade",
        Ordering::Greater => "mbi-newer",
    }
}

fn stable_class(mbi: &str, stable: &str) -> &'static str {
    match compare_versions(mbi, stable) {
        Ordering::Equal => "stable-up-to-date",
        Ordering::Less => "downgrade",
        Ordering::Greater => "mbi-newer",
    }
}
