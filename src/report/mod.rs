pub mod display;
pub mod loader;
pub mod overview;
pub mod page_role;
pub mod page_sections;
pub mod score;
pub mod tokens;
pub mod view;

use anyhow::Result;

use crate::report::overview::OverviewParser;
use crate::report::page_sections::PageSectionParser;

/// Compiled parsers shared by every view built during one command.
#[derive(Debug)]
pub struct ReportParsers {
    pub overview: OverviewParser,
    pub page_sections: PageSectionParser,
}

impl ReportParsers {
    pub fn new() -> Result<Self> {
        Ok(Self {
            overview: OverviewParser::new()?,
            page_sections: PageSectionParser::new()?,
        })
    }
}
