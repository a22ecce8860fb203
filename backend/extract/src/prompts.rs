//! Instruction text for the vision endpoint.
//!
//! The receipts are Indonesian weighing slips (BUKTI PENIMBANGAN), often
//! photographed at odd angles and sometimes carrying Chinese characters in
//! the material line.

/// System framing for receipt extraction.
pub const EXTRACTION_SYSTEM: &str = "\
You are a delivery receipt OCR assistant specializing in Indonesian \
weighing receipts (BUKTI PENIMBANGAN). Extract structured quantitative \
data from the provided image and return a single valid JSON object, with \
no commentary, markdown, or text outside the JSON. Receipts are in \
Indonesian and may contain Chinese characters.

The image may be rotated at any angle (90, 180, 270 degrees); read the \
text regardless of orientation. If the image is unreadable or is not a \
weighing receipt, return the required JSON fields with empty strings and \
zeros.";

/// Field-by-field extraction instruction.
pub const EXTRACTION_PROMPT: &str = "\
Extract the complete delivery data from this Indonesian weighing receipt.

Fields to identify:
1. NO NOTA: receipt/note number (e.g. A125BD00183725122415O1)
2. NOMOR TIMBANGAN: scale number (e.g. T21)
3. WAKTU PENIMBANGAN: weighing date and time
4. NOMOR UNIT: vehicle registration number (e.g. B9683TVX)
5. NAMA MATERIAL: material name, keep Chinese characters if present
6. BERAT ISI: gross weight in tons
7. BERAT KOSONG: empty vehicle weight in tons
8. BERAT BERSIH: net material weight in tons

Return exactly these JSON keys:
- receipt_number (string)
- scale_number (string)
- weighing_datetime (string, YYYY-MM-DD HH:MM:SS, 24-hour)
- vehicle_number (string)
- material_name (string, exactly as printed)
- gross_weight (number, tons)
- empty_weight (number, tons)
- net_weight (number, tons)
- confidence_score (number, 0.0-1.0, your confidence in the extraction)

Constraints: all weights are numeric tons; net weight should be close to \
gross_weight - empty_weight; if a value is unclear, give your best guess \
and lower the confidence score.";

/// System framing for material categorization.
pub const CATEGORIZATION_SYSTEM: &str = "\
You categorize boulder and construction material names. The name may be \
Indonesian and/or Chinese. Assign it to exactly one category from the \
list and return ONLY the category name in Indonesian. Note: 'BATU PECAH' \
is crushed stone; look for a size fraction like 1/2, 2/3 or 3/5.";

/// Categorization request for one raw material name.
pub fn categorization_prompt(material_name: &str) -> String {
    format!(
        "Material: \"{material_name}\"\n\n\
         Categories: Batu Pecah 1/2, Batu Pecah 2/3, Batu Pecah 3/5, \
         Batu Sungai, Boulder, Kerikil, Pasir, Abu Batu, Lainnya\n\n\
         Return ONLY the category name."
    )
}
