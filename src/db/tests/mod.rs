use crate::extract::ListingEntry;


/// Listing entry for `/node/{n}` with a derived title
pub(super) fn entry(n: u32) -> ListingEntry {
    ListingEntry {
        source_url: format!("https://erlar.ru/node/{n}"),
        title: format!("Җыр {n}"),
        composer: "Радик".to_string(),
        lyricist: String::new(),
    }
}

/// Completion with fixed metadata and the given body and artifact name
pub(super) fn completion(body: &str, artifact_name: &str) -> crate::db::Completion {
    crate::db::Completion {
        title: "Җыр".to_string(),
        composer: "Радик".to_string(),
        lyricist: String::new(),
        body: body.to_string(),
        artifact_name: artifact_name.to_string(),
    }
}
