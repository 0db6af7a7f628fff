pub mod formatter;

pub use formatter::{
    format_json, format_record_detail, format_score, format_scored_table, format_stars,
    format_summary, format_tsv, format_utilization, should_use_colors,
};
