//! Schema entities and their persistence operations.
//!
//! Each submodule owns one table: the row type, the form accepted by the admin
//! views, and the queries behind list/get/create/update/delete.

use serde::{Deserialize, Serialize};

pub mod image;
pub mod property;
pub mod role;
pub mod user;

pub use image::Image;
pub use property::Property;
pub use role::Role;
pub use user::User;

/// Upper bound for `page_size` on list views.
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&page_size=` on list views. Pages are 0-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    /// Resolves the requested window against the configured default size.
    pub fn resolve(&self, default_size: u32) -> (u32, u32) {
        let size = self.page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        (self.page.unwrap_or(0), size)
    }

    pub fn limit_offset(&self, default_size: u32) -> (i64, i64) {
        let (page, size) = self.resolve(default_size);
        (size as i64, page as i64 * size as i64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, params: &PageParams, default_size: u32, total: i64) -> Self {
        let (page, page_size) = params.resolve(default_size);
        Self { items, page, page_size, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}
