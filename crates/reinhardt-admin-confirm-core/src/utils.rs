//! Small string helpers

/// `snake_case` to `Title Case`
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::utils::snake_to_title_case;
///
/// assert_eq!(snake_to_title_case("show_message"), "Show Message");
/// assert_eq!(snake_to_title_case("make_PUBLIC"), "Make Public");
/// ```
pub fn snake_to_title_case(name: &str) -> String {
	name.split('_')
		.filter(|word| !word.is_empty())
		.map(capitalize)
		.collect::<Vec<_>>()
		.join(" ")
}

fn capitalize(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first
			.to_uppercase()
			.chain(chars.flat_map(char::to_lowercase))
			.collect(),
		None => String::new(),
	}
}
