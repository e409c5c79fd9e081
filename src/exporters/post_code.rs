//! `PostCode.csv`: the postal code lookup in table order

use super::{ExportContext, ExporterKind};
use crate::error::Result;

/// Write every postal code that has both a code and a district name
pub fn export(ctx: &ExportContext) -> Result<u64> {
    let mut sink = ctx.sink(ExporterKind::PostCode)?;
    let mut ticker = ctx.ticker(ExporterKind::PostCode.output_file());

    for (_, postal) in ctx.lookups.postal_codes.iter() {
        ticker.tick();
        if !postal.code.is_empty() && !postal.district_name.is_empty() {
            sink.write(postal)?;
        }
    }

    ticker.finish();
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassStrategy;
    use crate::exporters::test_support::{context, data_lines};
    use crate::lookup::SharedLookups;
    use crate::models::PostalCode;

    fn postal(code: &str, name: &str) -> PostalCode {
        PostalCode {
            code: code.to_string(),
            district_name: name.to_string(),
        }
    }

    #[test]
    fn test_incomplete_entries_are_skipped() {
        let mut lookups = SharedLookups::default();
        lookups.postal_codes.insert("a".to_string(), postal("8000", "Aarhus C"));
        lookups.postal_codes.insert("b".to_string(), postal("", "Nowhere"));
        lookups.postal_codes.insert("c".to_string(), postal("9000", ""));
        lookups.postal_codes.insert("d".to_string(), postal("1050", "København K"));
        let (ctx, sinks) = context("{}", lookups, PassStrategy::SinglePass);

        assert_eq!(export(&ctx).unwrap(), 2);
        assert_eq!(
            data_lines(&sinks, ExporterKind::PostCode),
            vec!["8000;;Aarhus C", "1050;;København K"]
        );
    }
}
