use crate::resolve::name::{Placeholder, with_suffix};
use std::collections::{HashMap, HashSet};

/// Makes every desired name in a batch unique, preserving input order.
///
/// The first occurrence of a name keeps it. The n-th repeat gets `_{n:03}`
/// inserted before the extension (`a.jpg`, `a_001.jpg`, `a_002.jpg`), with a
/// counter per distinct name that only ever increases. A generated name that
/// is already taken by an earlier entry (a literal `a_001.jpg` in the input,
/// say) is skipped in favour of the next number. Placeholder names are passed
/// through unchanged and don't count towards anything.
///
/// Pure and deterministic: the output depends only on the order of the input,
/// and an already-unique list comes back unchanged.
///
/// ```
/// use renamr_library::resolve::resolve_duplicates;
///
/// let resolved = resolve_duplicates([(1, "a.jpg"), (2, "a.jpg"), (3, "b.jpg")]);
/// assert_eq!(resolved, [(1, "a.jpg".to_string()), (2, "a_001.jpg".to_string()), (3, "b.jpg".to_string())]);
/// ```
pub fn resolve_duplicates<Id, S>(candidates: impl IntoIterator<Item = (Id, S)>) -> Vec<(Id, String)>
where
    S: Into<String>,
{
    let mut emitted: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, u32> = HashMap::new();
    let mut resolved = Vec::new();

    for (id, name) in candidates {
        let name: String = name.into();
        if Placeholder::classify(&name).is_some() || emitted.insert(name.clone()) {
            resolved.push((id, name));
            continue;
        }
        let counter = counters.entry(name.clone()).or_insert(0);
        let unique = loop {
            *counter += 1;
            let candidate = with_suffix(&name, &format!("_{:03}", *counter));
            if !emitted.contains(&candidate) {
                break candidate;
            }
        };
        tracing::debug!(name = %name, unique = %unique, "Resolved duplicate name");
        emitted.insert(unique.clone());
        resolved.push((id, unique));
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<const N: usize>(input: [&str; N]) -> Vec<String> {
        resolve_duplicates(input.into_iter().enumerate()).into_iter().map(|(_, name)| name).collect()
    }

    #[test]
    fn test_deterministic_suffixing() {
        let resolved = resolve_duplicates([(1, "a.jpg"), (2, "a.jpg"), (3, "a.jpg"), (4, "b.jpg")]);
        assert_eq!(
            resolved,
            vec![
                (1, "a.jpg".to_string()),
                (2, "a_001.jpg".to_string()),
                (3, "a_002.jpg".to_string()),
                (4, "b.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn test_already_unique_is_unchanged() {
        let input = ["2024-05-01 Prague.jpg", "2024-05-01 Prague.mp4", "2024-05-02 Vienna.jpg"];
        assert_eq!(names(input), input);
        // Running it again on its own output changes nothing.
        let once = names(["x.jpg", "x.jpg", "x.jpg"]);
        let twice: Vec<String> =
            resolve_duplicates(once.iter().cloned().enumerate()).into_iter().map(|(_, name)| name).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_interleaved_names_keep_separate_counters() {
        assert_eq!(
            names(["a.jpg", "b.jpg", "a.jpg", "b.jpg", "a.jpg"]),
            ["a.jpg", "b.jpg", "a_001.jpg", "b_001.jpg", "a_002.jpg"]
        );
    }

    #[test]
    fn test_extensionless_names() {
        assert_eq!(names(["notes", "notes", ""]), ["notes", "notes_001", ""]);
        assert_eq!(names(["", ""]), ["", "_001"]);
    }

    #[test]
    fn test_placeholders_pass_through() {
        assert_eq!(
            names(["No metadata", "No metadata", "Error: bad EXIF", "Error: bad EXIF", "a.jpg"]),
            ["No metadata", "No metadata", "Error: bad EXIF", "Error: bad EXIF", "a.jpg"]
        );
    }

    #[test]
    fn test_generated_name_never_collides_with_literal() {
        // The second "a.jpg" would become "a_001.jpg", which is already taken.
        assert_eq!(names(["a_001.jpg", "a.jpg", "a.jpg"]), ["a_001.jpg", "a.jpg", "a_002.jpg"]);
        // And a literal arriving after a generated one is suffixed itself.
        assert_eq!(names(["a.jpg", "a.jpg", "a_001.jpg"]), ["a.jpg", "a_001.jpg", "a_001_001.jpg"]);
    }

    #[test]
    fn test_output_is_unique() {
        let input = ["a.jpg", "a_001.jpg", "a.jpg", "a.jpg", "a_002.jpg", "a_001.jpg", "b", "b", "b_001"];
        let resolved = names(input);
        let unique: HashSet<&String> = resolved.iter().collect();
        assert_eq!(unique.len(), input.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_duplicates(Vec::<(u32, String)>::new()).is_empty());
    }
}
