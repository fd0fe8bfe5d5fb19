//! Bilingual text printed on exported documents.

use crate::config::Language;
use crate::core::catalog::Category;

/// Printed label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Document title
    QuotationTitle,
    /// Price list title
    PriceListTitle,
    /// Quotation number
    QuotationNo,
    /// Date
    Date,
    /// Customer section heading
    CustomerSection,
    /// Customer's company
    Company,
    /// Contact person
    Customer,
    /// Architect
    Architect,
    /// Product section heading
    ProductSection,
    /// Product
    Product,
    /// Color
    Color,
    /// Category
    Category,
    /// Thickness
    Thickness,
    /// Base price
    BasePrice,
    /// Depth table heading
    DepthTable,
    /// Panel table heading
    PanelTable,
    /// Hood panel table heading
    HoodTable,
    /// Depth column
    Depth,
    /// Length column
    Mtul,
    /// Area column
    SquareMeters,
    /// Quantity column
    Quantity,
    /// Unit price column
    UnitPrice,
    /// Line total column
    Total,
    /// Subtotal row
    Subtotal,
    /// Services heading
    Services,
    /// Skirting
    Skirting,
    /// Labor heading
    Labor,
    /// Discounts heading
    Discounts,
    /// List discount
    ListDiscount,
    /// Depth/panel discount
    DepthPanelDiscount,
    /// Price summary heading
    Summary,
    /// List price
    ListPrice,
    /// Price after discounts
    FinalPrice,
    /// VAT line
    Vat,
    /// Grand total
    GrandTotal,
    /// Legal notes heading
    Notes,
    /// Panel column in the price list
    Panel,
}

impl Label {
    /// Text in the requested language
    #[must_use]
    pub const fn text(self, language: Language) -> &'static str {
        match self {
            Self::QuotationTitle => language.pick("FİYAT TEKLİFİ", "QUOTATION"),
            Self::PriceListTitle => language.pick("FİYAT LİSTESİ", "PRICE LIST"),
            Self::QuotationNo => language.pick("Teklif No", "Quotation No"),
            Self::Date => language.pick("Tarih", "Date"),
            Self::CustomerSection => language.pick("Müşteri Bilgileri", "Customer"),
            Self::Company => language.pick("Firma", "Company"),
            Self::Customer => language.pick("Yetkili", "Contact"),
            Self::Architect => language.pick("Mimar", "Architect"),
            Self::ProductSection | Self::Product => language.pick("Ürün", "Product"),
            Self::Color => language.pick("Renk", "Color"),
            Self::Category => language.pick("Kategori", "Category"),
            Self::Thickness => language.pick("Kalınlık", "Thickness"),
            Self::BasePrice => language.pick("Birim Fiyat (MTÜL)", "Base price (per MTÜL)"),
            Self::DepthTable => language.pick("Tezgah", "Countertop"),
            Self::PanelTable => language.pick("Panel", "Panels"),
            Self::HoodTable => language.pick("Davlumbaz Paneli", "Hood panels"),
            Self::Depth => language.pick("Derinlik", "Depth"),
            Self::Mtul => "MTÜL",
            Self::SquareMeters => "m²",
            Self::Quantity => language.pick("Adet", "Qty"),
            Self::UnitPrice => language.pick("Birim", "Unit"),
            Self::Total => language.pick("Tutar", "Amount"),
            Self::Subtotal => language.pick("Ara Toplam", "Subtotal"),
            Self::Services => language.pick("Ek Hizmetler", "Extras"),
            Self::Skirting => language.pick("Süpürgelik", "Skirting"),
            Self::Labor => language.pick("İşçilik", "Labor"),
            Self::Discounts => language.pick("İndirimler", "Discounts"),
            Self::ListDiscount => language.pick("Liste İndirimi", "List discount"),
            Self::DepthPanelDiscount => language.pick("Tezgah/Panel İndirimi", "Countertop/panel discount"),
            Self::Summary => language.pick("Fiyat Özeti", "Price summary"),
            Self::ListPrice => language.pick("Liste Fiyatı", "List price"),
            Self::FinalPrice => language.pick("İndirimli Fiyat", "Net price"),
            Self::Vat => language.pick("KDV (%20)", "VAT (20%)"),
            Self::GrandTotal => language.pick("Genel Toplam", "Grand total"),
            Self::Notes => language.pick("Notlar", "Notes"),
            Self::Panel => "Panel (m²)",
        }
    }
}

/// Category name in the requested language
#[must_use]
pub const fn category_name(category: Category, language: Language) -> &'static str {
    match category {
        Category::Quartz => language.pick("Kuvars", "Quartz"),
        Category::Porcelain => language.pick("Porselen", "Porcelain"),
    }
}

/// Fixed terms printed under the summary
#[must_use]
pub const fn legal_notes(language: Language) -> [&'static str; 4] {
    match language {
        Language::Tr => [
            "Teklifimiz düzenleme tarihinden itibaren 15 gün geçerlidir.",
            "Ölçüler yerinde keşif sonrası kesinleşir; fiyat kesin ölçüye göre güncellenir.",
            "Sipariş onayında %50 avans, teslimatta kalan bakiye tahsil edilir.",
            "Doğal taş ve porselen yüzeylerde renk ve desen farklılıkları olabilir.",
        ],
        Language::En => [
            "This quotation is valid for 15 days from the date of issue.",
            "Measurements are confirmed after the site survey; the price follows the final measurements.",
            "A 50% advance is due on order confirmation, the balance on delivery.",
            "Stone and porcelain surfaces may vary in color and pattern.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_differ_by_language() {
        assert_eq!(Label::QuotationTitle.text(Language::En), "QUOTATION");
        assert_eq!(Label::QuotationTitle.text(Language::Tr), "FİYAT TEKLİFİ");
        assert_eq!(category_name(Category::Porcelain, Language::Tr), "Porselen");
        assert_ne!(legal_notes(Language::Tr), legal_notes(Language::En));
    }
}
