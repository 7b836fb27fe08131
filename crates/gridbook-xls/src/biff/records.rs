//! BIFF8 record type constants.

/// Beginning of a substream (workbook globals or one worksheet)
pub const BOF: u16 = 0x0809;
/// End of the current substream
pub const EOF: u16 = 0x000A;
/// Continuation of the previous record's body
pub const CONTINUE: u16 = 0x003C;

/// Worksheet directory entry in the globals substream
pub const BOUNDSHEET: u16 = 0x0085;
/// Shared string table
pub const SST: u16 = 0x00FC;
/// Font definition
pub const FONT: u16 = 0x0031;
/// Number format definition
pub const FORMAT: u16 = 0x041E;
/// Extended format (style cross-reference)
pub const XF: u16 = 0x00E0;
/// Named cell style
pub const STYLE: u16 = 0x0293;
/// Colour palette override
pub const PALETTE: u16 = 0x0092;

/// Text cell referencing the SST
pub const LABELSST: u16 = 0x00FD;
/// Inline text cell
pub const LABEL: u16 = 0x0204;
/// Packed number cell
pub const RK: u16 = 0x027E;
/// Row slice of packed numbers
pub const MULRK: u16 = 0x00BD;
/// IEEE double cell
pub const NUMBER: u16 = 0x0203;
/// Boolean or error cell
pub const BOOLERR: u16 = 0x0205;
/// Formula cell
pub const FORMULA: u16 = 0x0006;
/// String result of the preceding FORMULA
pub const STRING: u16 = 0x0207;
/// Shared formula body
pub const SHRFMLA: u16 = 0x04BC;
/// Empty styled cell
pub const BLANK: u16 = 0x0201;
/// Row slice of empty styled cells
pub const MULBLANK: u16 = 0x00BE;

/// Row properties
pub const ROW: u16 = 0x0208;
/// Column-range properties
pub const COLINFO: u16 = 0x007D;
/// Used-range declaration
pub const DIMENSIONS: u16 = 0x0200;
/// Merged rectangles
pub const MERGECELLS: u16 = 0x00E5;
/// Hyperlink
pub const HLINK: u16 = 0x01B8;
/// Cell comment marker
pub const NOTE: u16 = 0x001C;
/// Text object (carries comment text)
pub const TXO: u16 = 0x01B6;

/// BOF version word for BIFF8
pub const BIFF8_VERSION: u16 = 0x0600;
/// BOF substream type: workbook globals
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
/// BOF substream type: worksheet
pub const BOF_WORKSHEET: u16 = 0x0010;
