//! Fixtures shared by unit tests.

use chrono::{TimeZone, Utc};

use crate::types::{Page, PageId, Revision, RevisionId, Web, WebId, WebSettings};

pub fn web(id: i64, address: &str) -> Web {
    Web {
        id: WebId::new(id),
        name: address.to_string(),
        address: address.to_string(),
        settings: WebSettings::default(),
    }
}

pub fn page(id: i64, web: &Web, name: &str) -> Page {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Page {
        id: PageId::new(id),
        web_id: web.id,
        name: name.to_string(),
        created_at: at,
        updated_at: at,
    }
}

pub fn revision(id: i64, page: &Page, number: u32, content: &str) -> Revision {
    Revision {
        id: RevisionId::new(id),
        page_id: page.id,
        number,
        content: content.to_string(),
        author: "AnonymousCoward".to_string(),
        created_at: Utc
            .with_ymd_and_hms(2024, 1, 1, 0, number, 0)
            .unwrap(),
    }
}
