//! HTML fixtures shaped like the catalog site's listing and item pages

/// One listing row: item href, title, composer, lyricist
pub struct Row<'a> {
    pub href: &'a str,
    pub title: &'a str,
    pub composer: &'a str,
    pub lyricist: &'a str,
}

/// Listing page with a views table of `rows`
pub fn listing_page(rows: &[Row<'_>]) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            format!(
                r#"
            <tr class="odd">
              <td class="views-field views-field-title"><a href="{}">{}</a></td>
              <td class="views-field views-field-tid"><a href="/taxonomy/term/1">{}</a></td>
              <td class="views-field views-field-tid-1"><a href="/taxonomy/term/2">{}</a></td>
            </tr>"#,
                row.href, row.title, row.composer, row.lyricist
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html><head><title>Җырлар</title></head><body>
  <div id="sidebar"><a href="/node/999">Реклама</a></div>
  <table class="views-table cols-3"><tbody>{rows}
  </tbody></table>
  <div class="item-list"><ul class="pager"><li><a href="/asongs?page=1">2</a></li></ul></div>
</body></html>"#
    )
}

/// Item page with a title, attribution block and one paragraph per stanza
pub fn item_page(title: &str, composer: &str, lyricist: &str, stanzas: &[&str]) -> String {
    let stanzas: String = stanzas
        .iter()
        .enumerate()
        .map(|(i, stanza)| {
            let class = if i % 2 == 0 { "line_one" } else { "line_two" };
            format!(r#"<p class="{class}">{}</p>"#, stanza.replace('\n', "<br />\n"))
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html><body>
  <h1 class="title">{title}</h1>
  <div class="songinfo">
    <div class="composer">Көй: <a href="/taxonomy/term/1">{composer}</a></div>
    <div class="autor">Сүзләр: <a href="/taxonomy/term/2">{lyricist}</a></div>
  </div>
  <div class="song">
    <div class="fivestar-static-form-item"><div class="fivestar">Рейтинг: 4.5</div></div>
    {stanzas}
  </div>
</body></html>"#
    )
}
