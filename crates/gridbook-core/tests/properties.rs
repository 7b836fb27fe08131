//! Property-based round-trip laws for the reference codec and normaliser.

use gridbook_core::{
    cell_name, column_index, column_name, coords_from_cell_name, normalize, CellValue, Workbook,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn column_codec_round_trips(i in 0u32..10_000) {
        prop_assert_eq!(column_index(&column_name(i)), Some(i));
    }

    #[test]
    fn cell_name_round_trips(col in 0u32..1_000, row in 0u32..1_000_000) {
        let name = cell_name(col, row);
        prop_assert_eq!(
            coords_from_cell_name(&name).unwrap(),
            (Some(col), Some(row))
        );
    }

    #[test]
    fn normalize_is_idempotent(
        cells in proptest::collection::vec((0u32..20, 0u32..20, -1000.0f64..1000.0), 0..40),
        styled in proptest::collection::vec((0u32..20, 0u32..20), 0..10),
    ) {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet("Sheet1");
        for (row, col, n) in &cells {
            ws.set_value(*row, *col, CellValue::Number(*n));
        }
        for (row, col) in &styled {
            ws.set_css(*row, *col, "border-right: 1px solid #000000; color: #333333;");
        }

        normalize(&mut wb);
        let dims = wb.worksheets[0].min_dimensions;
        let style_table = wb.style.clone();
        let style_map = wb.worksheets[0].style.clone();
        let data = wb.worksheets[0].data.clone();

        normalize(&mut wb);
        prop_assert_eq!(wb.worksheets[0].min_dimensions, dims);
        prop_assert_eq!(&wb.style, &style_table);
        prop_assert_eq!(&wb.worksheets[0].style, &style_map);
        prop_assert_eq!(&wb.worksheets[0].data, &data);
    }

    #[test]
    fn style_indices_stay_in_range(
        styled in proptest::collection::vec((0u32..30, 0u32..30, 0u8..4), 0..60),
    ) {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet("Sheet1");
        let palette = [
            "color: #000000;",
            "color: #FF0000;",
            "background-color: #EEEEEE;",
            "font-style: italic;",
        ];
        for (row, col, which) in &styled {
            ws.set_css(*row, *col, palette[*which as usize]);
        }

        normalize(&mut wb);
        let ws = &wb.worksheets[0];
        let (cols, rows) = ws.min_dimensions;
        for (addr, idx) in &ws.style {
            prop_assert!((*idx as usize) < wb.style.len());
            let (c, r) = coords_from_cell_name(addr).unwrap();
            prop_assert!(c.unwrap() < cols);
            prop_assert!(r.unwrap() < rows);
        }
    }
}
