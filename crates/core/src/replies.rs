//! Customer-facing reply texts and operator alert templates.
//!
//! All customer communication happens through these chat messages; the HTTP
//! layer never exposes errors beyond status codes.

pub const DEFECT_ALERT_SUBJECT: &str = "⚠️ CLIENTE COM DEFEITO/GARANTIA";
pub const DELIVERY_ALERT_SUBJECT: &str = "🚗 CLIENTE PERGUNTANDO SOBRE ENTREGA";

pub const DEFECT_HANDOFF: &str = "Entendi que você tem um problema com seu produto. 😟\n\nVou passar você para nosso time de atendimento especializado em garantia.\n\nUm momento...";

pub const STOCK_UNAVAILABLE: &str = "Desculpa, não consegui acessar nosso estoque agora. Tenta novamente em alguns segundos! 😊";

pub const OUT_OF_STOCK: &str = "No momento, não temos produtos em estoque. Mas estamos recebendo novidades em breve! 🚀";

pub const STOCK_HEADER: &str = "📦 *Produtos em Estoque:*\n\n";
pub const STOCK_FOOTER: &str = "Quer saber mais sobre algum produto? 😊";

pub const PRICES_UNAVAILABLE: &str = "Desculpa, não consegui acessar nossos preços agora. Tenta novamente! 😊";

pub const PRICE_HEADER: &str = "💰 *Nossos Preços:*\n\n";
pub const PRICE_FOOTER: &str = "\nQuer mais informações? 😊";

pub const DELIVERY_OPTIONS: &str = "Ótimo! 🚚\n\nPara entregas, oferecemos:\n\n✅ *Frete Normal* - 5-7 dias úteis\n✅ *Uber Eats* - Entrega rápida (quando disponível)\n\nVou passar você para nosso time de vendas confirmar a melhor opção para você! Um momento... 😊";

pub const WELCOME_MENU: &str = "Oi! 👋 Bem-vindo à nossa loja de eletrônicos! 🎉\n\nComo posso ajudar você hoje?\n\n• Quer saber sobre *produtos em estoque*?\n• Quer conhecer nossos *preços*?\n• Tem dúvidas sobre *entrega*?\n\nÉ só chamar! 😊";

pub const FALLBACK_MENU: &str = "Desculpa, não entendi muito bem sua pergunta. 🤔\n\nPosso ajudar com:\n\n• Produtos em estoque\n• Preços\n• Informações de entrega\n• Dúvidas sobre produtos\n\nTenta reformular sua pergunta! 😊";

/// Body of the side-channel alert delivered to the operator phone.
pub fn operator_alert(subject: &str, sender_id: &str, original_text: &str) -> String {
    format!("🔔 *{subject}*\n\nTelefone: {sender_id}\nMensagem: {original_text}")
}
