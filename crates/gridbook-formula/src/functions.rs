//! The BIFF8 built-in function table.
//!
//! `tFunc`/`tFuncVar` tokens carry a 16-bit index into this table (the
//! `Ftab` of [MS-XLS]). Indices absent from the table render as
//! `FUNC{index}`. Index 255 is the user-defined-function escape and is
//! handled by the decoder itself, not listed here.

/// Function names keyed by 16-bit index, sorted for binary search.
const FTAB: &[(u16, &str)] = &[
    (0, "COUNT"),
    (1, "IF"),
    (2, "ISNA"),
    (3, "ISERROR"),
    (4, "SUM"),
    (5, "AVERAGE"),
    (6, "MIN"),
    (7, "MAX"),
    (8, "ROW"),
    (9, "COLUMN"),
    (10, "NA"),
    (11, "NPV"),
    (12, "STDEV"),
    (13, "DOLLAR"),
    (14, "FIXED"),
    (15, "SIN"),
    (16, "COS"),
    (17, "TAN"),
    (18, "ATAN"),
    (19, "PI"),
    (20, "SQRT"),
    (21, "EXP"),
    (22, "LN"),
    (23, "LOG10"),
    (24, "ABS"),
    (25, "INT"),
    (26, "SIGN"),
    (27, "ROUND"),
    (28, "LOOKUP"),
    (29, "INDEX"),
    (30, "REPT"),
    (31, "MID"),
    (32, "LEN"),
    (33, "VALUE"),
    (34, "TRUE"),
    (35, "FALSE"),
    (36, "AND"),
    (37, "OR"),
    (38, "NOT"),
    (39, "MOD"),
    (40, "DCOUNT"),
    (41, "DSUM"),
    (42, "DAVERAGE"),
    (43, "DMIN"),
    (44, "DMAX"),
    (45, "DSTDEV"),
    (46, "VAR"),
    (47, "DVAR"),
    (48, "TEXT"),
    (49, "LINEST"),
    (50, "TREND"),
    (51, "LOGEST"),
    (52, "GROWTH"),
    (53, "GOTO"),
    (54, "HALT"),
    (55, "RETURN"),
    (56, "PV"),
    (57, "FV"),
    (58, "NPER"),
    (59, "PMT"),
    (60, "RATE"),
    (61, "MIRR"),
    (62, "IRR"),
    (63, "RAND"),
    (64, "MATCH"),
    (65, "DATE"),
    (66, "TIME"),
    (67, "DAY"),
    (68, "MONTH"),
    (69, "YEAR"),
    (70, "WEEKDAY"),
    (71, "HOUR"),
    (72, "MINUTE"),
    (73, "SECOND"),
    (74, "NOW"),
    (75, "AREAS"),
    (76, "ROWS"),
    (77, "COLUMNS"),
    (78, "OFFSET"),
    (79, "ABSREF"),
    (80, "RELREF"),
    (81, "ARGUMENT"),
    (82, "SEARCH"),
    (83, "TRANSPOSE"),
    (84, "ERROR"),
    (85, "STEP"),
    (86, "TYPE"),
    (87, "ECHO"),
    (88, "SET.NAME"),
    (89, "CALLER"),
    (90, "DEREF"),
    (91, "WINDOWS"),
    (92, "SERIES"),
    (93, "DOCUMENTS"),
    (94, "ACTIVE.CELL"),
    (95, "SELECTION"),
    (96, "RESULT"),
    (97, "ATAN2"),
    (98, "ASIN"),
    (99, "ACOS"),
    (100, "CHOOSE"),
    (101, "HLOOKUP"),
    (102, "VLOOKUP"),
    (103, "LINKS"),
    (104, "INPUT"),
    (105, "ISREF"),
    (106, "GET.FORMULA"),
    (107, "GET.NAME"),
    (108, "SET.VALUE"),
    (109, "LOG"),
    (110, "EXEC"),
    (111, "CHAR"),
    (112, "LOWER"),
    (113, "UPPER"),
    (114, "PROPER"),
    (115, "LEFT"),
    (116, "RIGHT"),
    (117, "EXACT"),
    (118, "TRIM"),
    (119, "REPLACE"),
    (120, "SUBSTITUTE"),
    (121, "CODE"),
    (122, "NAMES"),
    (123, "DIRECTORY"),
    (124, "FIND"),
    (125, "CELL"),
    (126, "ISERR"),
    (127, "ISTEXT"),
    (128, "ISNUMBER"),
    (129, "ISBLANK"),
    (130, "T"),
    (131, "N"),
    (132, "FOPEN"),
    (133, "FCLOSE"),
    (134, "FSIZE"),
    (135, "FREADLN"),
    (136, "FREAD"),
    (137, "FWRITELN"),
    (138, "FWRITE"),
    (139, "FPOS"),
    (140, "DATEVALUE"),
    (141, "TIMEVALUE"),
    (142, "SLN"),
    (143, "SYD"),
    (144, "DDB"),
    (145, "GET.DEF"),
    (146, "REFTEXT"),
    (147, "TEXTREF"),
    (148, "INDIRECT"),
    (149, "REGISTER"),
    (150, "CALL"),
    (151, "ADD.BAR"),
    (152, "ADD.MENU"),
    (153, "ADD.COMMAND"),
    (154, "ENABLE.COMMAND"),
    (155, "CHECK.COMMAND"),
    (156, "RENAME.COMMAND"),
    (157, "SHOW.BAR"),
    (158, "DELETE.MENU"),
    (159, "DELETE.COMMAND"),
    (160, "GET.CHART.ITEM"),
    (161, "DIALOG.BOX"),
    (162, "CLEAN"),
    (163, "MDETERM"),
    (164, "MINVERSE"),
    (165, "MMULT"),
    (166, "FILES"),
    (167, "IPMT"),
    (168, "PPMT"),
    (169, "COUNTA"),
    (170, "CANCEL.KEY"),
    (171, "FOR"),
    (172, "WHILE"),
    (173, "BREAK"),
    (174, "NEXT"),
    (175, "INITIATE"),
    (176, "REQUEST"),
    (177, "POKE"),
    (178, "EXECUTE"),
    (179, "TERMINATE"),
    (180, "RESTART"),
    (181, "HELP"),
    (182, "GET.BAR"),
    (183, "PRODUCT"),
    (184, "FACT"),
    (185, "GET.CELL"),
    (186, "GET.WORKSPACE"),
    (187, "GET.WINDOW"),
    (188, "GET.DOCUMENT"),
    (189, "DPRODUCT"),
    (190, "ISNONTEXT"),
    (191, "GET.NOTE"),
    (192, "NOTE"),
    (193, "STDEVP"),
    (194, "VARP"),
    (195, "DSTDEVP"),
    (196, "DVARP"),
    (197, "TRUNC"),
    (198, "ISLOGICAL"),
    (199, "DCOUNTA"),
    (200, "DELETE.BAR"),
    (201, "UNREGISTER"),
    (204, "USDOLLAR"),
    (205, "FINDB"),
    (206, "SEARCHB"),
    (207, "REPLACEB"),
    (208, "LEFTB"),
    (209, "RIGHTB"),
    (210, "MIDB"),
    (211, "LENB"),
    (212, "ROUNDUP"),
    (213, "ROUNDDOWN"),
    (214, "ASC"),
    (215, "DBCS"),
    (216, "RANK"),
    (219, "ADDRESS"),
    (220, "DAYS360"),
    (221, "TODAY"),
    (222, "VDB"),
    (223, "ELSE"),
    (224, "ELSE.IF"),
    (225, "END.IF"),
    (226, "FOR.CELL"),
    (227, "MEDIAN"),
    (228, "SUMPRODUCT"),
    (229, "SINH"),
    (230, "COSH"),
    (231, "TANH"),
    (232, "ASINH"),
    (233, "ACOSH"),
    (234, "ATANH"),
    (235, "DGET"),
    (236, "CREATE.OBJECT"),
    (237, "VOLATILE"),
    (238, "LAST.ERROR"),
    (239, "CUSTOM.UNDO"),
    (240, "CUSTOM.REPEAT"),
    (241, "FORMULA.CONVERT"),
    (242, "GET.LINK.INFO"),
    (243, "TEXT.BOX"),
    (244, "INFO"),
    (245, "GROUP"),
    (246, "GET.OBJECT"),
    (247, "DB"),
    (248, "PAUSE"),
    (251, "RESUME"),
    (252, "FREQUENCY"),
    (253, "ADD.TOOLBAR"),
    (254, "DELETE.TOOLBAR"),
    (256, "RESET.TOOLBAR"),
    (257, "EVALUATE"),
    (258, "GET.TOOLBAR"),
    (259, "GET.TOOL"),
    (260, "SPELLING.CHECK"),
    (261, "ERROR.TYPE"),
    (262, "APP.TITLE"),
    (263, "WINDOW.TITLE"),
    (264, "SAVE.TOOLBAR"),
    (265, "ENABLE.TOOL"),
    (266, "PRESS.TOOL"),
    (267, "REGISTER.ID"),
    (268, "GET.WORKBOOK"),
    (269, "AVEDEV"),
    (270, "BETADIST"),
    (271, "GAMMALN"),
    (272, "BETAINV"),
    (273, "BINOMDIST"),
    (274, "CHIDIST"),
    (275, "CHIINV"),
    (276, "COMBIN"),
    (277, "CONFIDENCE"),
    (278, "CRITBINOM"),
    (279, "EVEN"),
    (280, "EXPONDIST"),
    (281, "FDIST"),
    (282, "FINV"),
    (283, "FISHER"),
    (284, "FISHERINV"),
    (285, "FLOOR"),
    (286, "GAMMADIST"),
    (287, "GAMMAINV"),
    (288, "CEILING"),
    (289, "HYPGEOMDIST"),
    (290, "LOGNORMDIST"),
    (291, "LOGINV"),
    (292, "NEGBINOMDIST"),
    (293, "NORMDIST"),
    (294, "NORMSDIST"),
    (295, "NORMINV"),
    (296, "NORMSINV"),
    (297, "STANDARDIZE"),
    (298, "ODD"),
    (299, "PERMUT"),
    (300, "POISSON"),
    (301, "TDIST"),
    (302, "WEIBULL"),
    (303, "SUMXMY2"),
    (304, "SUMX2MY2"),
    (305, "SUMX2PY2"),
    (306, "CHITEST"),
    (307, "CORREL"),
    (308, "COVAR"),
    (309, "FORECAST"),
    (310, "FTEST"),
    (311, "INTERCEPT"),
    (312, "PEARSON"),
    (313, "RSQ"),
    (314, "STEYX"),
    (315, "SLOPE"),
    (316, "TTEST"),
    (317, "PROB"),
    (318, "DEVSQ"),
    (319, "GEOMEAN"),
    (320, "HARMEAN"),
    (321, "SUMSQ"),
    (322, "KURT"),
    (323, "SKEW"),
    (324, "ZTEST"),
    (325, "LARGE"),
    (326, "SMALL"),
    (327, "QUARTILE"),
    (328, "PERCENTILE"),
    (329, "PERCENTRANK"),
    (330, "MODE"),
    (331, "TRIMMEAN"),
    (332, "TINV"),
    (334, "MOVIE.COMMAND"),
    (335, "GET.MOVIE"),
    (336, "CONCATENATE"),
    (337, "POWER"),
    (338, "PIVOT.ADD.DATA"),
    (339, "GET.PIVOT.TABLE"),
    (340, "GET.PIVOT.FIELD"),
    (341, "GET.PIVOT.ITEM"),
    (342, "RADIANS"),
    (343, "DEGREES"),
    (344, "SUBTOTAL"),
    (345, "SUMIF"),
    (346, "COUNTIF"),
    (347, "COUNTBLANK"),
    (348, "SCENARIO.GET"),
    (349, "OPTIONS.LISTS.GET"),
    (350, "ISPMT"),
    (351, "DATEDIF"),
    (352, "DATESTRING"),
    (353, "NUMBERSTRING"),
    (354, "ROMAN"),
    (355, "OPEN.DIALOG"),
    (356, "SAVE.DIALOG"),
    (357, "VIEW.GET"),
    (358, "GETPIVOTDATA"),
    (359, "HYPERLINK"),
    (360, "PHONETIC"),
    (361, "AVERAGEA"),
    (362, "MAXA"),
    (363, "MINA"),
    (364, "STDEVPA"),
    (365, "VARPA"),
    (366, "STDEVA"),
    (367, "VARA"),
    (368, "BAHTTEXT"),
    (369, "THAIDAYOFWEEK"),
    (370, "THAIDIGIT"),
    (371, "THAIMONTHOFYEAR"),
    (372, "THAINUMSOUND"),
    (373, "THAINUMSTRING"),
    (374, "THAISTRINGLENGTH"),
    (375, "ISTHAIDIGIT"),
    (376, "ROUNDBAHTDOWN"),
    (377, "ROUNDBAHTUP"),
    (378, "THAIYEAR"),
    (379, "RTD"),
    (380, "CUBEVALUE"),
    (381, "CUBEMEMBER"),
    (382, "CUBEMEMBERPROPERTY"),
    (383, "CUBERANKEDMEMBER"),
    (384, "HEX2BIN"),
    (385, "HEX2DEC"),
    (386, "HEX2OCT"),
    (387, "DEC2BIN"),
    (388, "DEC2HEX"),
    (389, "DEC2OCT"),
    (390, "OCT2BIN"),
    (391, "OCT2HEX"),
    (392, "OCT2DEC"),
    (393, "BIN2DEC"),
    (394, "BIN2OCT"),
    (395, "BIN2HEX"),
    (396, "IMSUB"),
    (397, "IMDIV"),
    (398, "IMPOWER"),
    (399, "IMABS"),
    (400, "IMSQRT"),
    (401, "IMLN"),
    (402, "IMLOG2"),
    (403, "IMLOG10"),
    (404, "IMSIN"),
    (405, "IMCOS"),
    (406, "IMEXP"),
    (407, "IMARGUMENT"),
    (408, "IMCONJUGATE"),
    (409, "IMAGINARY"),
    (410, "IMREAL"),
    (411, "COMPLEX"),
    (412, "IMSUM"),
    (413, "IMPRODUCT"),
    (414, "SERIESSUM"),
    (415, "FACTDOUBLE"),
    (416, "SQRTPI"),
    (417, "QUOTIENT"),
    (418, "DELTA"),
    (419, "GESTEP"),
    (420, "ISEVEN"),
    (421, "ISODD"),
    (422, "MROUND"),
    (423, "ERF"),
    (424, "ERFC"),
    (425, "BESSELJ"),
    (426, "BESSELK"),
    (427, "BESSELY"),
    (428, "BESSELI"),
    (429, "XIRR"),
    (430, "XNPV"),
    (431, "PRICEMAT"),
    (432, "YIELDMAT"),
    (433, "INTRATE"),
    (434, "RECEIVED"),
    (435, "DISC"),
    (436, "PRICEDISC"),
    (437, "YIELDDISC"),
    (438, "TBILLEQ"),
    (439, "TBILLPRICE"),
    (440, "TBILLYIELD"),
    (441, "PRICE"),
    (442, "YIELD"),
    (443, "DOLLARDE"),
    (444, "DOLLARFR"),
    (445, "NOMINAL"),
    (446, "EFFECT"),
    (447, "CUMPRINC"),
    (448, "CUMIPMT"),
    (449, "EDATE"),
    (450, "EOMONTH"),
    (451, "YEARFRAC"),
    (452, "COUPDAYBS"),
    (453, "COUPDAYS"),
    (454, "COUPDAYSNC"),
    (455, "COUPNCD"),
    (456, "COUPNUM"),
    (457, "COUPPCD"),
    (458, "DURATION"),
    (459, "MDURATION"),
    (460, "ODDLPRICE"),
    (461, "ODDLYIELD"),
    (462, "ODDFPRICE"),
    (463, "ODDFYIELD"),
    (464, "RANDBETWEEN"),
    (465, "WEEKNUM"),
    (466, "AMORDEGRC"),
    (467, "AMORLINC"),
    (468, "CONVERT"),
    (469, "ACCRINT"),
    (470, "ACCRINTM"),
    (471, "WORKDAY"),
    (472, "NETWORKDAYS"),
    (473, "GCD"),
    (474, "MULTINOMIAL"),
    (475, "LCM"),
    (476, "FVSCHEDULE"),
    (477, "CUBEKPIMEMBER"),
    (478, "CUBESET"),
    (479, "CUBESETCOUNT"),
    (480, "IFERROR"),
    (481, "COUNTIFS"),
    (482, "SUMIFS"),
    (483, "AVERAGEIF"),
    (484, "AVERAGEIFS"),
];

/// Argument counts for the fixed-arity functions used by `tFunc`.
///
/// `tFuncVar` carries its own count and never consults this table.
/// Indices not present default to 1.
const FIXED_ARGC: &[(u16, u8)] = &[
    (2, 1),   // ISNA
    (3, 1),   // ISERROR
    (10, 0),  // NA
    (15, 1),  // SIN
    (16, 1),  // COS
    (17, 1),  // TAN
    (18, 1),  // ATAN
    (19, 0),  // PI
    (20, 1),  // SQRT
    (21, 1),  // EXP
    (22, 1),  // LN
    (23, 1),  // LOG10
    (24, 1),  // ABS
    (25, 1),  // INT
    (26, 1),  // SIGN
    (27, 2),  // ROUND
    (30, 2),  // REPT
    (31, 3),  // MID
    (32, 1),  // LEN
    (33, 1),  // VALUE
    (34, 0),  // TRUE
    (35, 0),  // FALSE
    (38, 1),  // NOT
    (39, 2),  // MOD
    (40, 3),  // DCOUNT
    (41, 3),  // DSUM
    (42, 3),  // DAVERAGE
    (43, 3),  // DMIN
    (44, 3),  // DMAX
    (45, 3),  // DSTDEV
    (47, 3),  // DVAR
    (48, 2),  // TEXT
    (61, 3),  // MIRR
    (63, 0),  // RAND
    (65, 3),  // DATE
    (66, 3),  // TIME
    (67, 1),  // DAY
    (68, 1),  // MONTH
    (69, 1),  // YEAR
    (71, 1),  // HOUR
    (72, 1),  // MINUTE
    (73, 1),  // SECOND
    (74, 0),  // NOW
    (75, 1),  // AREAS
    (76, 1),  // ROWS
    (77, 1),  // COLUMNS
    (83, 1),  // TRANSPOSE
    (86, 1),  // TYPE
    (97, 2),  // ATAN2
    (98, 1),  // ASIN
    (99, 1),  // ACOS
    (105, 1), // ISREF
    (111, 1), // CHAR
    (112, 1), // LOWER
    (113, 1), // UPPER
    (114, 1), // PROPER
    (117, 2), // EXACT
    (118, 1), // TRIM
    (119, 4), // REPLACE
    (121, 1), // CODE
    (126, 1), // ISERR
    (127, 1), // ISTEXT
    (128, 1), // ISNUMBER
    (129, 1), // ISBLANK
    (130, 1), // T
    (131, 1), // N
    (140, 1), // DATEVALUE
    (141, 1), // TIMEVALUE
    (142, 3), // SLN
    (143, 4), // SYD
    (162, 1), // CLEAN
    (163, 1), // MDETERM
    (164, 1), // MINVERSE
    (165, 2), // MMULT
    (184, 1), // FACT
    (189, 3), // DPRODUCT
    (190, 1), // ISNONTEXT
    (195, 3), // DSTDEVP
    (196, 3), // DVARP
    (198, 1), // ISLOGICAL
    (199, 3), // DCOUNTA
    (207, 4), // REPLACEB
    (210, 3), // MIDB
    (211, 1), // LENB
    (212, 2), // ROUNDUP
    (213, 2), // ROUNDDOWN
    (214, 1), // ASC
    (215, 1), // DBCS
    (221, 0), // TODAY
    (229, 1), // SINH
    (230, 1), // COSH
    (231, 1), // TANH
    (232, 1), // ASINH
    (233, 1), // ACOSH
    (234, 1), // ATANH
    (235, 3), // DGET
    (244, 1), // INFO
    (252, 2), // FREQUENCY
    (261, 1), // ERROR.TYPE
    (271, 1), // GAMMALN
    (273, 4), // BINOMDIST
    (274, 2), // CHIDIST
    (275, 2), // CHIINV
    (276, 2), // COMBIN
    (277, 3), // CONFIDENCE
    (278, 3), // CRITBINOM
    (279, 1), // EVEN
    (280, 3), // EXPONDIST
    (281, 3), // FDIST
    (282, 3), // FINV
    (283, 1), // FISHER
    (284, 1), // FISHERINV
    (285, 2), // FLOOR
    (286, 4), // GAMMADIST
    (287, 3), // GAMMAINV
    (288, 2), // CEILING
    (289, 4), // HYPGEOMDIST
    (290, 3), // LOGNORMDIST
    (291, 3), // LOGINV
    (292, 3), // NEGBINOMDIST
    (293, 4), // NORMDIST
    (294, 1), // NORMSDIST
    (295, 3), // NORMINV
    (296, 1), // NORMSINV
    (297, 3), // STANDARDIZE
    (298, 1), // ODD
    (299, 2), // PERMUT
    (300, 3), // POISSON
    (301, 3), // TDIST
    (302, 4), // WEIBULL
    (303, 2), // SUMXMY2
    (304, 2), // SUMX2MY2
    (305, 2), // SUMX2PY2
    (306, 2), // CHITEST
    (307, 2), // CORREL
    (308, 2), // COVAR
    (309, 3), // FORECAST
    (310, 2), // FTEST
    (311, 2), // INTERCEPT
    (312, 2), // PEARSON
    (313, 2), // RSQ
    (314, 2), // STEYX
    (315, 2), // SLOPE
    (316, 4), // TTEST
    (325, 2), // LARGE
    (326, 2), // SMALL
    (327, 2), // QUARTILE
    (328, 2), // PERCENTILE
    (331, 2), // TRIMMEAN
    (332, 2), // TINV
    (337, 2), // POWER
    (342, 1), // RADIANS
    (343, 1), // DEGREES
    (346, 2), // COUNTIF
    (347, 1), // COUNTBLANK
    (350, 4), // ISPMT
    (351, 3), // DATEDIF
    (352, 1), // DATESTRING
    (353, 2), // NUMBERSTRING
    (354, 2), // ROMAN
    (360, 1), // PHONETIC
    (368, 1), // BAHTTEXT
];

/// Look up a built-in function name by its 16-bit index.
pub fn function_name(index: u16) -> Option<&'static str> {
    FTAB.binary_search_by_key(&index, |&(i, _)| i)
        .ok()
        .map(|pos| FTAB[pos].1)
}

/// Argument count for a fixed-arity function; unknown indices default to 1.
pub fn fixed_arg_count(index: u16) -> u8 {
    FIXED_ARGC
        .binary_search_by_key(&index, |&(i, _)| i)
        .ok()
        .map(|pos| FIXED_ARGC[pos].1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_indices() {
        assert_eq!(function_name(0), Some("COUNT"));
        assert_eq!(function_name(1), Some("IF"));
        assert_eq!(function_name(4), Some("SUM"));
        assert_eq!(function_name(15), Some("SIN"));
        assert_eq!(function_name(19), Some("PI"));
        assert_eq!(function_name(100), Some("CHOOSE"));
        assert_eq!(function_name(101), Some("HLOOKUP"));
        assert_eq!(function_name(102), Some("VLOOKUP"));
        assert_eq!(function_name(148), Some("INDIRECT"));
        assert_eq!(function_name(336), Some("CONCATENATE"));
        assert_eq!(function_name(480), Some("IFERROR"));
        assert_eq!(function_name(484), Some("AVERAGEIFS"));
    }

    #[test]
    fn test_gaps_are_absent() {
        for idx in [202u16, 203, 217, 218, 249, 250, 255, 333, 1000] {
            assert_eq!(function_name(idx), None);
        }
    }

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in FTAB.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
        for pair in FIXED_ARGC.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn test_fixed_arg_counts() {
        assert_eq!(fixed_arg_count(19), 0); // PI
        assert_eq!(fixed_arg_count(15), 1); // SIN
        assert_eq!(fixed_arg_count(27), 2); // ROUND
        assert_eq!(fixed_arg_count(31), 3); // MID
        assert_eq!(fixed_arg_count(9999), 1); // fallback
    }
}
