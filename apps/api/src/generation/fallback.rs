//! Deterministic resume rewrite used when the model gateway is unavailable.
//!
//! Keyword-triggered template selection: the job description is checked for
//! backend flavored terms and one of two canned summaries is emitted. Nothing
//! here calls out of process.

use chrono::NaiveDate;

/// Case-insensitive substrings that select the backend-oriented blocks.
pub const BACKEND_KEYWORDS: [&str; 3] = ["backend", "server", "api"];

const SECTION_HEADERS: [&str; 4] = ["Professional Summary", "Work Experience", "Education", "Skills"];
const CONTACT_MARKERS: [&str; 2] = ["Vancouver", "@"];
const NAME_LINE_MAX_CHARS: usize = 50;

const BACKEND_SUMMARY: &str = "Aspiring Backend Developer with strong foundation in Web and Mobile \
App Development. Leveraging project coordination experience to build server-side applications. \
Passionate about API development, database management, and scalable architectures.";

const GENERIC_SUMMARY: &str = "Aspiring Developer with strong foundation in Web and Mobile App \
Development. Translating customer service excellence into user-centric software development. \
Experienced in project coordination and technical troubleshooting.";

const BACKEND_SKILLS: [&str; 5] = [
    "• Backend Development: Node.js, Express.js, Server Architecture",
    "• Database Management: SQL, MongoDB, Database Design",
    "• API Development: REST APIs, Integration",
    "• Programming: JavaScript, TypeScript",
    "• Development Tools: Git, Version Control",
];

pub fn is_backend_role(job_description: Option<&str>) -> bool {
    job_description
        .map(str::to_lowercase)
        .is_some_and(|jd| BACKEND_KEYWORDS.iter().any(|k| jd.contains(k)))
}

/// First non-blank short line that is not a known section header.
fn find_name_line<'a>(lines: &[&'a str]) -> Option<&'a str> {
    lines.iter().copied().find(|line| {
        !line.trim().is_empty()
            && line.chars().count() < NAME_LINE_MAX_CHARS
            && !SECTION_HEADERS.iter().any(|h| line.contains(h))
    })
}

fn find_contact_line<'a>(lines: &[&'a str]) -> Option<&'a str> {
    lines
        .iter()
        .copied()
        .find(|line| CONTACT_MARKERS.iter().any(|m| line.contains(m)))
}

/// Rewrites `original` for the job. `custom_requirements` is accepted for
/// parity with the model path but does not change the template.
pub fn fallback_generate(
    original: &str,
    job_description: Option<&str>,
    _custom_requirements: Option<&str>,
    today: NaiveDate,
) -> String {
    let lines: Vec<&str> = original.lines().collect();
    let backend = is_backend_role(job_description);
    let mut out = String::new();

    if let Some(name) = find_name_line(&lines) {
        out.push_str(name.trim());
        out.push('\n');
    }
    if let Some(contact) = find_contact_line(&lines) {
        out.push_str(contact.trim());
        out.push('\n');
    }
    out.push('\n');

    out.push_str("Professional Summary\n---------------\n");
    out.push_str(if backend { BACKEND_SUMMARY } else { GENERIC_SUMMARY });
    out.push_str("\n\n");

    out.push_str("Technical Skills\n--------------\n");
    if backend {
        for skill in BACKEND_SKILLS {
            out.push_str(skill);
            out.push('\n');
        }
    }

    out.push_str("\nProfessional Experience\n----------------------\n");
    out.push_str(&format!(
        "Resume enhanced for job application on {}\n",
        today.format("%-m/%-d/%Y")
    ));
    out.push_str("AI Enhancement: Intelligent resume modification\n");

    out
}
