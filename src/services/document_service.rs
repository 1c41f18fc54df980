// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::{business::Business, finance::JobFinancials, jobs::Job},
};

#[derive(Clone)]
pub struct DocumentService;

impl DocumentService {
    // Renderiza a fatura do job de instalação em memória: cabeçalho da
    // empresa, linhas derivadas (as MESMAS da etapa invoice), totais e
    // o bloco Pix com QR Code quando a empresa tem chave configurada.
    pub fn generate_invoice_pdf(
        job: &Job,
        financials: &JobFinancials,
        customer_name: &str,
        business: &Business,
    ) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta 'fonts/'
        let font_family = genpdf::fonts::from_files("./fonts", "Roboto", None)
            .map_err(|_| anyhow::anyhow!("Fonte não encontrada na pasta ./fonts"))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Fatura - {}", job.title));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new(business.name.clone())
            .styled(style::Style::new().bold().with_font_size(18)));

        if let Some(addr) = &business.address {
            doc.push(elements::Paragraph::new(addr.clone())
                .styled(style::Style::new().with_font_size(10)));
        }

        doc.push(elements::Break::new(1.5));

        doc.push(elements::Paragraph::new(format!("FATURA - {}", job.title))
            .styled(style::Style::new().bold().with_font_size(14)));

        doc.push(elements::Paragraph::new(format!("Data: {}", job.updated_at.format("%d/%m/%Y"))));
        doc.push(elements::Paragraph::new(format!("Cliente: {}", customer_name)));

        doc.push(elements::Break::new(2));

        // --- TABELA DE ITENS ---
        // Pesos das colunas: Descrição (4), Qtd (1), Preço (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        // Header da Tabela
        let style_bold = style::Style::new().bold();
        table.row()
            .element(elements::Paragraph::new("Produto").styled(style_bold))
            .element(elements::Paragraph::new("Qtd").styled(style_bold))
            .element(elements::Paragraph::new("Unitário").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .expect("Table error");

        // Linhas. Sem produto nenhum, a fatura vira uma linha única com
        // a cotação (mesma regra de fallback do subtotal).
        if financials.line_items.is_empty() {
            table.row()
                .element(elements::Paragraph::new(job.title.clone()))
                .element(elements::Paragraph::new("1"))
                .element(elements::Paragraph::new(format!("R$ {:.2}", financials.subtotal)))
                .element(elements::Paragraph::new(format!("R$ {:.2}", financials.subtotal)))
                .push()
                .expect("Table row error");
        } else {
            for item in &financials.line_items {
                table.row()
                    .element(elements::Paragraph::new(item.description.clone()))
                    .element(elements::Paragraph::new(format!("{:.2}", item.quantity)))
                    .element(elements::Paragraph::new(format!("R$ {:.2}", item.unit_price)))
                    .element(elements::Paragraph::new(format!("R$ {:.2}", item.total)))
                    .push()
                    .expect("Table row error");
            }
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        // --- TOTAIS ---
        for (label, value) in [
            ("SUBTOTAL", financials.subtotal),
            ("DEPÓSITO PAGO", financials.deposit),
            ("SALDO A RECEBER", financials.balance),
        ] {
            let mut paragraph = elements::Paragraph::new(format!("{}: R$ {:.2}", label, value));
            paragraph.set_alignment(genpdf::Alignment::Right);
            doc.push(paragraph.styled(style::Style::new().bold().with_font_size(12)));
        }

        doc.push(elements::Break::new(2));

        // --- ÁREA DE PAGAMENTO (QR CODE) ---
        if let Some(key) = &business.pix_key {
            doc.push(elements::Paragraph::new("PAGAMENTO VIA PIX")
                .styled(style::Style::new().bold().with_font_size(12)));

            doc.push(elements::Paragraph::new(format!("Chave: {}", key)));
            doc.push(elements::Break::new(1));

            // QR Code simples da chave (não é o payload EMV completo)
            let code = QrCode::new(key.as_bytes())
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

            let image_buffer = code.render::<Luma<u8>>().build();
            let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

            let pdf_image = genpdf::elements::Image::from_dynamic_image(dynamic_image)
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
                .with_scale(genpdf::Scale::new(0.5, 0.5));

            doc.push(pdf_image);
        }

        // Renderiza para buffer (memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}
