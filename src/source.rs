/// Splits a camel-case metric name into its component words.
///
/// A word boundary falls before every upper-case letter that follows a
/// lower-case one; runs of consecutive capitals stay together as one word.
pub fn camel_case_split(input: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_is_lower = false;

    for ch in input.chars() {
        if ch.is_uppercase() && prev_is_lower {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev_is_lower = ch.is_lowercase();
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Assembles the dotted, lower-case source identifier for a metric stream
/// from its namespace and metric short name, e.g.
/// `("oci_vcn", "VnicFromNetworkMirrorBytes")` becomes
/// `oci.vcn.vnic.from.network.mirror.bytes`.
///
/// Any input produces a best-effort output; empty segments are dropped rather
/// than left as double dots.
pub fn source_name(namespace: &str, name: &str) -> String {
    let mut elements: Vec<String> = namespace.split('_').map(str::to_string).collect();
    elements.extend(camel_case_split(name));

    elements
        .iter()
        .filter(|element| !element.is_empty())
        .map(|element| element.to_lowercase())
        .collect::<Vec<_>>()
        .join(".")
}
