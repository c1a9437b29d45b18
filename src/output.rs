use std::io::Write;

use luxbet::utils::{format_brl, to_decimal};
use luxbet::{
    Affiliate, AffiliateMetrics, BalanceSnapshot, BalanceSource, Bet, DepositSession, GameCatalog,
    GameEntry, ManagerDashboard, Notification, Promotion, SubAffiliate, SupportConfig, Transaction,
    UserProfile,
};
use serde::Serialize;

use crate::error::CliError;

type Result<T = ()> = std::result::Result<T, CliError>;

/// Writes command results either as aligned text or as pretty JSON.
pub struct Output<W: Write> {
    w: W,
    json: bool,
}

fn brl(value: f64) -> String {
    format_brl(to_decimal(value))
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

impl<W: Write> Output<W> {
    pub fn new(w: W, json: bool) -> Self {
        Self { w, json }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result {
        serde_json::to_writer_pretty(&mut self.w, value)?;
        writeln!(self.w)?;
        Ok(())
    }

    pub fn line(&mut self, text: &str) -> Result {
        writeln!(self.w, "{text}")?;
        Ok(())
    }

    pub fn profile(&mut self, user: &UserProfile) -> Result {
        if self.json {
            return self.write_json(user);
        }
        writeln!(self.w, "{} <{}>", user.username, user.email)?;
        writeln!(self.w, "  id       {}", user.id)?;
        writeln!(self.w, "  role     {:?}", user.role)?;
        writeln!(self.w, "  balance  {}", brl(user.balance))?;
        writeln!(self.w, "  cpf      {}", or_dash(user.cpf.as_deref()))?;
        writeln!(self.w, "  phone    {}", or_dash(user.phone.as_deref()))?;
        Ok(())
    }

    pub fn balance(&mut self, b: &BalanceSnapshot) -> Result {
        if self.json {
            return self.write_json(b);
        }
        writeln!(self.w, "balance    {}", brl(b.display()))?;
        writeln!(self.w, "available  {}", brl(b.available()))?;
        if b.source == BalanceSource::LastKnown {
            writeln!(self.w, "(last known balance; the balance service did not answer)")?;
        } else if b.needs_sync {
            writeln!(
                self.w,
                "{} still held by the game provider, try again shortly",
                brl(b.total() - b.available())
            )?;
        }
        Ok(())
    }

    pub fn deposit(&mut self, d: &DepositSession) -> Result {
        if self.json {
            return self.write_json(d);
        }
        writeln!(self.w, "PIX deposit of {}", format_brl(d.amount))?;
        match d.copy_code() {
            Some(code) => writeln!(self.w, "copy and paste: {code}")?,
            None => writeln!(self.w, "no PIX code was returned")?,
        }
        if d.qr_code_base64.is_some() {
            writeln!(self.w, "(QR code image available with --json)")?;
        }
        Ok(())
    }

    pub fn games(&mut self, games: &[&GameEntry]) -> Result {
        if self.json {
            return self.write_json(games);
        }
        for g in games {
            writeln!(self.w, "{:<24} {:<12} {}", g.launch_code(), g.provider, g.title)?;
        }
        Ok(())
    }

    pub fn grouped(&mut self, catalog: &GameCatalog) -> Result {
        let groups = catalog.grouped();
        if self.json {
            return self.write_json(&groups);
        }
        for (provider, games) in groups {
            writeln!(self.w, "{provider} ({})", games.len())?;
            for g in games {
                writeln!(self.w, "  {:<24} {}", g.launch_code(), g.title)?;
            }
        }
        Ok(())
    }

    pub fn providers(&mut self, providers: &[String]) -> Result {
        if self.json {
            return self.write_json(providers);
        }
        for p in providers {
            writeln!(self.w, "{p}")?;
        }
        Ok(())
    }

    pub fn transactions(&mut self, list: &[Transaction]) -> Result {
        if self.json {
            return self.write_json(list);
        }
        if list.is_empty() {
            return self.line("no transactions");
        }
        for t in list {
            writeln!(
                self.w,
                "{:<8} {:<10} {:<10} {:>14}  {}",
                t.id,
                format!("{:?}", t.kind).to_lowercase(),
                format!("{:?}", t.status).to_lowercase(),
                brl(t.amount),
                or_dash(t.created_at.as_deref())
            )?;
        }
        Ok(())
    }

    pub fn bets(&mut self, list: &[Bet]) -> Result {
        if self.json {
            return self.write_json(list);
        }
        if list.is_empty() {
            return self.line("no bets");
        }
        for b in list {
            writeln!(
                self.w,
                "{:<24} {:<8} bet {:>12}  won {:>12}  {}",
                b.display_name(),
                b.status,
                brl(b.amount),
                brl(b.win_amount),
                or_dash(b.created_at.as_deref())
            )?;
        }
        Ok(())
    }

    pub fn notification(&mut self, n: &Notification) -> Result {
        if self.json {
            return self.write_json(n);
        }
        writeln!(self.w, "[{:?}] {}", n.kind, n.title)?;
        if !n.message.is_empty() {
            writeln!(self.w, "  {}", n.message)?;
        }
        if let Some(link) = n.link.as_deref().filter(|l| !l.is_empty()) {
            writeln!(self.w, "  {link}")?;
        }
        Ok(())
    }

    pub fn promotions(&mut self, list: &[Promotion]) -> Result {
        if self.json {
            return self.write_json(list);
        }
        if list.is_empty() {
            return self.line("no active promotions");
        }
        for p in list {
            writeln!(self.w, "{} [{}]", p.title, p.kind)?;
            let blurb = p.short_description.as_deref().unwrap_or(&p.description);
            if !blurb.is_empty() {
                writeln!(self.w, "  {blurb}")?;
            }
            if p.bonus_percentage > 0.0 {
                writeln!(
                    self.w,
                    "  bonus {}% up to {} (min deposit {})",
                    p.bonus_percentage,
                    brl(p.max_bonus),
                    brl(p.min_deposit)
                )?;
            }
        }
        Ok(())
    }

    pub fn support(&mut self, s: &SupportConfig) -> Result {
        if self.json {
            return self.write_json(s);
        }
        let whatsapp = s.whatsapp_link.as_deref().or(s.whatsapp_number.as_deref());
        writeln!(self.w, "whatsapp  {}", or_dash(whatsapp))?;
        writeln!(self.w, "phone     {}", or_dash(s.phone_number.as_deref()))?;
        writeln!(self.w, "email     {}", or_dash(s.email.as_deref()))?;
        writeln!(self.w, "chat      {}", or_dash(s.chat_link.as_deref()))?;
        writeln!(self.w, "hours     {}", or_dash(s.working_hours.as_deref()))?;
        Ok(())
    }

    pub fn affiliate(&mut self, a: &Affiliate, link: Option<&str>) -> Result {
        if self.json {
            return self.write_json(a);
        }
        writeln!(self.w, "code         {}", a.affiliate_code)?;
        if let Some(link) = link {
            writeln!(self.w, "link         {link}")?;
        }
        writeln!(self.w, "CPA          {}", brl(a.cpa_amount))?;
        writeln!(self.w, "revshare     {}%", a.revshare_percentage)?;
        writeln!(self.w, "referrals    {}", a.total_referrals)?;
        writeln!(self.w, "deposits     {}", brl(a.total_deposits))?;
        writeln!(self.w, "earnings     {}", brl(a.total_earnings))?;
        Ok(())
    }

    pub fn metrics(&mut self, m: &AffiliateMetrics) -> Result {
        if self.json {
            return self.write_json(m);
        }
        writeln!(self.w, "period                 {}", m.period)?;
        writeln!(self.w, "new referrals          {}", m.novos_subordinados)?;
        writeln!(self.w, "deposits               {} ({})", m.depositos, brl(m.valor_deposito))?;
        writeln!(
            self.w,
            "first deposits         {} ({})",
            m.primeiros_depositos,
            brl(m.valor_primeiro_deposito)
        )?;
        writeln!(self.w, "withdrawals            {} ({})", m.numero_saques, brl(m.valor_saque))?;
        writeln!(self.w, "valid bets             {}", brl(m.apostas_validas))?;
        writeln!(self.w, "direct win/loss        {}", brl(m.vd_diretas))?;
        writeln!(self.w, "rewards                {}", brl(m.receber_recompensas))?;
        Ok(())
    }

    pub fn manager(&mut self, m: &ManagerDashboard) -> Result {
        if self.json {
            return self.write_json(m);
        }
        writeln!(self.w, "CPA pool          {}", brl(m.cpa_pool))?;
        writeln!(self.w, "CPA distributed   {}", brl(m.cpa_distributed))?;
        writeln!(self.w, "revshare          {}%", m.revshare_percentage)?;
        writeln!(self.w, "sub-affiliates    {}", m.sub_affiliates_count)?;
        writeln!(self.w, "earnings          {}", brl(m.total_earnings))?;
        Ok(())
    }

    pub fn sub_affiliates(&mut self, list: &[SubAffiliate]) -> Result {
        if self.json {
            return self.write_json(list);
        }
        if list.is_empty() {
            return self.line("no sub-affiliates");
        }
        for s in list {
            writeln!(
                self.w,
                "{:<16} {:<20} CPA {:>10}  rev {:>5}%  refs {}",
                s.affiliate_code,
                s.username,
                brl(s.cpa_amount),
                s.revshare_percentage,
                s.total_referrals
            )?;
        }
        Ok(())
    }
}
