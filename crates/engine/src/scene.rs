//! Derives a short illustration-prompt string from look output. The engine
//! only produces the text; rendering it is someone else's problem.

/// Strip roster and list lines from a look block and flatten what remains
/// (room name and description) into one prompt line.
pub fn scene_prompt(look: &str, suffix: &str) -> String {
    let mut keep = Vec::new();
    let mut skipping_list = false;

    for line in look.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // Section headers start list blocks we never want in a prompt.
        if trimmed.starts_with("Players here:")
            || trimmed.starts_with("Enemies:")
            || trimmed.starts_with("You can see:")
            || trimmed.starts_with("Exits:")
        {
            skipping_list = true;
            continue;
        }
        // Indented lines belong to the open list block.
        if line.starts_with("  ") && skipping_list {
            continue;
        }
        skipping_list = false;
        // Underline rows.
        if trimmed.chars().all(|c| c == '=' || c == '-') {
            continue;
        }
        keep.push(trimmed);
    }

    let description = keep.join(" ");
    if suffix.is_empty() {
        description
    } else {
        format!("{description}, {suffix}")
    }
}
